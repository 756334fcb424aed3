//! Run state, trace entries, and the final run result.
//!
//! A run is one end-to-end execution of the manager loop for a single
//! question. The trace is the audit record: one append-only entry per
//! tool invocation (stop decisions are not invocations and leave no
//! entry), so `trace.len()` never exceeds the initial budget.

use crate::fragment::ContextFragment;
use serde::{Deserialize, Serialize};

/// Maximum length of a trace entry summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 400;

/// Where a run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// The decision procedure chose to stop and supplied the final answer.
    Stopped,
    /// The budget hit zero before a stop decision; the answer was
    /// synthesized from the best available draft or fragments.
    Exhausted,
}

/// One tool invocation recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// 1-based step index, monotonically increasing.
    pub step: usize,

    /// Which tool ran ("inspect_context" or "draft_answer").
    pub tool: String,

    /// Short human-readable summary of what happened, including failures.
    pub summary: String,
}

impl TraceEntry {
    /// Build an entry, truncating the summary to [`SUMMARY_MAX_CHARS`].
    pub fn new(step: usize, tool: impl Into<String>, summary: &str) -> Self {
        Self {
            step,
            tool: tool.into(),
            summary: truncate_chars(summary, SUMMARY_MAX_CHARS),
        }
    }
}

/// Char-boundary-safe prefix truncation.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Everything a caller gets back from one manager run.
///
/// Constructed exactly once, at loop termination, and immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// The final answer text. Never empty.
    pub answer: String,

    /// Terminal state the loop reached.
    pub state: RunState,

    /// Ordered audit trail of tool invocations.
    pub trace: Vec<TraceEntry>,

    /// Most recent fragment set produced by `inspect_context`.
    pub fragments: Vec<ContextFragment>,

    /// Fragments consumed by the most recent draft, if any.
    pub draft_fragments: Vec<ContextFragment>,
}
