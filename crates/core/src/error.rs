//! Error types for the Labdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Labdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Upstream service errors ---
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    // --- Decision errors ---
    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Guide persistence ---
    #[error("Failed to persist study guide: {0}")]
    GuidePersistence(String),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures when calling the Retriever, the Chat Head, or the text
/// generation backend. A transport timeout is reported as `Unavailable`,
/// the same as a connection failure.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("{service} unreachable: {reason}")]
    Unavailable { service: String, reason: String },

    #[error("{service} violated its contract: {reason}")]
    Contract { service: String, reason: String },
}

impl UpstreamError {
    /// Connection failure or timeout against the named service.
    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// The service answered, but with a non-2xx status or a malformed body.
    pub fn contract(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Contract {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Which upstream failed.
    pub fn service(&self) -> &str {
        match self {
            Self::Unavailable { service, .. } | Self::Contract { service, .. } => service,
        }
    }
}

/// Failures internal to the decision procedure. These never escape the
/// manager loop: a malformed decision is replaced by the default policy.
#[derive(Debug, Clone, Error)]
pub enum DecisionError {
    #[error("Reasoning backend returned an unparseable choice: {0}")]
    Malformed(String),
}
