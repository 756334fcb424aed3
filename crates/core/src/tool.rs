//! Tool seams and the closed tool registry.
//!
//! The manager has exactly two tools: `inspect_context` (wraps the
//! Retriever) and `draft_answer` (wraps the Chat Head). The registry is a
//! closed set rather than open dynamic dispatch — the decision space is
//! a three-variant enum, so the loop's state machine stays exhaustively
//! testable.

use crate::error::UpstreamError;
use crate::fragment::{ContextFragment, DraftAnswer};
use async_trait::async_trait;
use std::sync::Arc;

/// Tool name constants, used in trace entries and manager prompts.
pub const INSPECT_CONTEXT: &str = "inspect_context";
pub const DRAFT_ANSWER: &str = "draft_answer";

/// The document-retrieval upstream.
///
/// Implementations issue a single outbound request per call — no caching,
/// no retries at this layer.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch up to `limit` ranked context fragments for the question.
    async fn inspect_context(
        &self,
        question: &str,
        limit: usize,
    ) -> std::result::Result<Vec<ContextFragment>, UpstreamError>;
}

/// The context-grounded chat upstream.
#[async_trait]
pub trait ChatHead: Send + Sync {
    /// Draft an answer grounded in the supplied fragments.
    ///
    /// An empty fragment set is still sent — the Chat Head may answer from
    /// its own grounding — and must not be rejected locally.
    async fn draft_answer(
        &self,
        question: &str,
        fragments: &[ContextFragment],
    ) -> std::result::Result<DraftAnswer, UpstreamError>;
}

/// The fixed set of tools available to the manager loop.
pub struct ToolRegistry {
    retriever: Arc<dyn Retriever>,
    chat: Arc<dyn ChatHead>,
}

impl ToolRegistry {
    pub fn new(retriever: Arc<dyn Retriever>, chat: Arc<dyn ChatHead>) -> Self {
        Self { retriever, chat }
    }

    /// Execute the `inspect_context` tool. Failures surface to the caller;
    /// the loop records them in the trace rather than swallowing them.
    pub async fn inspect_context(
        &self,
        question: &str,
        limit: usize,
    ) -> std::result::Result<Vec<ContextFragment>, UpstreamError> {
        self.retriever.inspect_context(question, limit).await
    }

    /// Execute the `draft_answer` tool.
    pub async fn draft_answer(
        &self,
        question: &str,
        fragments: &[ContextFragment],
    ) -> std::result::Result<DraftAnswer, UpstreamError> {
        self.chat.draft_answer(question, fragments).await
    }

    /// The two tool names, in a stable order.
    pub fn names(&self) -> [&'static str; 2] {
        [INSPECT_CONTEXT, DRAFT_ANSWER]
    }
}
