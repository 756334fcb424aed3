//! HTTP client implementations for Labdesk's three upstream services.
//!
//! - [`RetrieverClient`] — the Study RAG document retriever (`/query`)
//! - [`ChatClient`] — the Lab Copilot grounded chat head (`/chat`)
//! - [`GenerateClient`] — the plain text-generation backend
//!   (`/api/generate`, Ollama wire shape)
//!
//! Each client is a thin reqwest wrapper with a construction-time
//! timeout; a transport timeout surfaces as `UpstreamError::Unavailable`,
//! the same as a connection failure.

pub mod chat;
pub mod generate;
pub mod retriever;

mod http;

pub use chat::ChatClient;
pub use generate::GenerateClient;
pub use retriever::RetrieverClient;
