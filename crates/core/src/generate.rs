//! TextGenerator trait — the abstraction over the plain text-generation
//! backend.
//!
//! Used in two places: the manager's reasoning capability (choosing the
//! next action) and context summarisation in the pass-through modes.
//! The loop never depends on a concrete implementation — pure
//! polymorphism, so tests use scripted generators.

use crate::error::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single prompt-in, text-out generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The model to use (e.g. "llama3.1").
    pub model: String,

    /// The full prompt.
    pub prompt: String,

    /// Temperature (0.0 = deterministic).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.2
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// The text-generation seam.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// A human-readable name for this backend (e.g. "ollama").
    fn name(&self) -> &str;

    /// Generate a completion for the prompt. Returns the trimmed text.
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<String, UpstreamError>;
}
