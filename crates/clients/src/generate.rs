//! Text-generation backend client (Ollama wire shape).
//!
//! Calls `POST {base}/api/generate` with a non-streaming payload and
//! returns the trimmed `response` field. Used by the manager's decision
//! procedure and by the summarisation fallbacks in the pass-through
//! modes.

use async_trait::async_trait;
use labdesk_core::error::UpstreamError;
use labdesk_core::generate::{GenerateRequest, TextGenerator};
use labdesk_core::Result;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::http::{build_client, endpoint, post_json};

const SERVICE: &str = "generator";

/// HTTP client for the text-generation upstream.
pub struct GenerateClient {
    base_url: String,
    client: reqwest::Client,
}

impl GenerateClient {
    /// Create a client against the given base URL with a 120s timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: build_client(timeout),
        }
    }

    /// Probe the backend. Used by `labdesk doctor`.
    pub async fn health_check(&self) -> Result<bool> {
        let url = endpoint(&self.base_url, "/api/tags");
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[async_trait]
impl TextGenerator for GenerateClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<String, UpstreamError> {
        let url = endpoint(&self.base_url, "/api/generate");
        let mut payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "temperature": request.temperature,
            "num_ctx": 4096,
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            payload["num_predict"] = json!(max_tokens);
        }

        debug!(model = %request.model, prompt_len = request.prompt.len(), "Sending generation request");
        let body = post_json(&self.client, SERVICE, &url, &payload).await?;

        Ok(body
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}
