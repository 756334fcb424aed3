//! The decision seam — what the manager loop asks on every step.
//!
//! The action space is a closed, three-variant enum rather than
//! free-form tool dispatch: inspect retrieval context, draft (or
//! redraft) an answer, or stop with a final answer. Closing the space
//! keeps the loop's state machine exhaustively testable.

use crate::fragment::{ContextFragment, DraftAnswer};
use crate::run::TraceEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The next action the manager loop should take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Fetch ranked fragments from the Retriever. A decision may name its
    /// own result-count limit; otherwise the run's limit applies.
    InspectContext {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    /// Ask the Chat Head for a (re)draft grounded in the latest fragments.
    DraftAnswer,
    /// Stop the run and emit `answer` as the final answer.
    Stop { answer: String },
}

impl Action {
    /// Tool name for trace purposes; `None` for a stop decision, which is
    /// not a tool invocation.
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Action::InspectContext { .. } => Some(crate::tool::INSPECT_CONTEXT),
            Action::DraftAnswer => Some(crate::tool::DRAFT_ANSWER),
            Action::Stop { .. } => None,
        }
    }
}

/// One decision, with a short natural-language justification attached
/// for trace and debugging purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(flatten)]
    pub action: Action,

    #[serde(default)]
    pub justification: String,
}

impl Decision {
    pub fn new(action: Action, justification: impl Into<String>) -> Self {
        Self {
            action,
            justification: justification.into(),
        }
    }
}

/// Everything the decision procedure may look at: the running state of
/// one orchestration step.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// The user's question, immutable for the run.
    pub question: &'a str,

    /// Tool invocations still permitted.
    pub remaining_budget: u32,

    /// Trace so far, ordered.
    pub trace: &'a [TraceEntry],

    /// Most recent retrieval output, if any.
    pub latest_fragments: Option<&'a [ContextFragment]>,

    /// Most recent draft, if any.
    pub latest_draft: Option<&'a DraftAnswer>,
}

/// The manager's brain, behind a seam.
///
/// Contract: exactly one decision per call; with `remaining_budget == 0`
/// the implementation must return [`Action::Stop`]. Implementations are
/// expected to absorb their own failures (malformed output, timeouts)
/// via a default policy so that `decide` is infallible and the loop
/// always makes forward progress.
#[async_trait]
pub trait DecisionProcedure: Send + Sync {
    async fn decide(&self, ctx: DecisionContext<'_>) -> Decision;
}

/// The guaranteed-progress fallback, shared by every implementation:
/// draft first if no draft exists yet, otherwise stop with the latest
/// draft's text verbatim.
pub fn default_policy(ctx: &DecisionContext<'_>, why: &str) -> Decision {
    match ctx.latest_draft {
        None => Decision::new(Action::DraftAnswer, why.to_string()),
        Some(draft) => Decision::new(
            Action::Stop {
                answer: draft.text.clone(),
            },
            why.to_string(),
        ),
    }
}
