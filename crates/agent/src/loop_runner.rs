//! The manager loop — bounded tool orchestration.
//!
//! Drives the decision procedure and the tool registry together under a
//! hard step budget, accumulating an append-only trace, and resolves the
//! terminal answer. A run is infallible: upstream failures are recorded
//! in the trace and spent against the budget, never propagated, so the
//! caller always receives a [`RunResult`].

use labdesk_core::decision::{Action, DecisionContext, DecisionProcedure};
use labdesk_core::fragment::{ContextFragment, DraftAnswer};
use labdesk_core::run::{RunResult, RunState, TraceEntry};
use labdesk_core::tool::{DRAFT_ANSWER, INSPECT_CONTEXT, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default maximum tool invocations per run.
pub const DEFAULT_BUDGET: u32 = 4;

/// The orchestration loop for manager mode.
pub struct ManagerLoop {
    /// The manager's brain.
    decider: Arc<dyn DecisionProcedure>,

    /// The closed two-tool set.
    tools: Arc<ToolRegistry>,

    /// Maximum tool invocations per run.
    budget: u32,
}

impl ManagerLoop {
    /// Create a new loop with the default budget.
    pub fn new(decider: Arc<dyn DecisionProcedure>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            decider,
            tools,
            budget: DEFAULT_BUDGET,
        }
    }

    /// Set the maximum number of tool invocations.
    pub fn with_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    /// Run the loop to a terminal state for one question.
    ///
    /// `limit` is the result-count limit applied when a decision inspects
    /// context without naming its own. Makes at most `budget` tool
    /// invocations and `budget + 1` decision calls.
    pub async fn run(&self, question: &str, limit: usize) -> RunResult {
        let mut remaining = self.budget;
        let mut trace: Vec<TraceEntry> = Vec::new();
        let mut latest_fragments: Option<Vec<ContextFragment>> = None;
        let mut latest_draft: Option<DraftAnswer> = None;

        info!(budget = self.budget, limit, "Manager run starting");

        while remaining > 0 {
            let decision = self
                .decider
                .decide(DecisionContext {
                    question,
                    remaining_budget: remaining,
                    trace: &trace,
                    latest_fragments: latest_fragments.as_deref(),
                    latest_draft: latest_draft.as_ref(),
                })
                .await;

            debug!(
                step = trace.len() + 1,
                remaining,
                justification = %decision.justification,
                "Manager decision"
            );

            let step = trace.len() + 1;
            match decision.action {
                Action::Stop { answer } => {
                    info!(steps = trace.len(), "Manager stopped with an answer");
                    return RunResult {
                        answer,
                        state: RunState::Stopped,
                        trace,
                        fragments: latest_fragments.unwrap_or_default(),
                        draft_fragments: latest_draft
                            .map(|d| d.fragments_used)
                            .unwrap_or_default(),
                    };
                }

                Action::InspectContext { limit: asked } => {
                    let k = asked.unwrap_or(limit);
                    let summary = match self.tools.inspect_context(question, k).await {
                        Ok(fragments) => {
                            let summary = match fragments.first() {
                                Some(first) => first.render(),
                                None => "(no fragments found)".to_string(),
                            };
                            latest_fragments = Some(fragments);
                            summary
                        }
                        Err(e) => {
                            warn!(error = %e, "inspect_context failed");
                            format!("FAILED: {e}")
                        }
                    };
                    trace.push(TraceEntry::new(step, INSPECT_CONTEXT, &summary));
                }

                Action::DraftAnswer => {
                    let fragments = latest_fragments.as_deref().unwrap_or(&[]);
                    let summary = match self.tools.draft_answer(question, fragments).await {
                        Ok(draft) => {
                            let summary = if draft.text.is_empty() {
                                "(empty draft)".to_string()
                            } else {
                                draft.text.clone()
                            };
                            latest_draft = Some(draft);
                            summary
                        }
                        Err(e) => {
                            warn!(error = %e, "draft_answer failed");
                            format!("FAILED: {e}")
                        }
                    };
                    trace.push(TraceEntry::new(step, DRAFT_ANSWER, &summary));
                }
            }

            remaining -= 1;
        }

        // Budget exhausted without a stop decision: synthesize the final
        // answer from what the run produced.
        info!(steps = trace.len(), "Budget exhausted, synthesizing answer");
        let fragments = latest_fragments.unwrap_or_default();
        let (answer, draft_fragments) = match latest_draft {
            Some(draft) => (draft.text, draft.fragments_used),
            None => (no_draft_answer(&fragments), Vec::new()),
        };

        RunResult {
            answer,
            state: RunState::Exhausted,
            trace,
            fragments,
            draft_fragments,
        }
    }
}

/// Fallback answer when the budget ran out before any draft existed:
/// states that no draft was available and surfaces the latest fragments
/// verbatim, so the caller always gets a non-empty answer.
fn no_draft_answer(fragments: &[ContextFragment]) -> String {
    if fragments.is_empty() {
        return "No draft answer was produced within the step budget, and no retrieval \
                context is available."
            .to_string();
    }

    let mut answer = String::from(
        "No draft answer was produced within the step budget. \
         The most recent retrieval context follows:\n",
    );
    for fragment in fragments {
        answer.push('\n');
        answer.push_str(&fragment.render());
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use labdesk_core::decision::Decision;
    use labdesk_core::error::UpstreamError;
    use labdesk_core::tool::{ChatHead, Retriever};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed list of decisions, then stops.
    struct ScriptedDecider {
        script: Mutex<Vec<Action>>,
    }

    impl ScriptedDecider {
        fn new(actions: Vec<Action>) -> Self {
            Self {
                script: Mutex::new(actions),
            }
        }
    }

    #[async_trait]
    impl DecisionProcedure for ScriptedDecider {
        async fn decide(&self, _ctx: DecisionContext<'_>) -> Decision {
            let mut script = self.script.lock().unwrap();
            let action = if script.is_empty() {
                Action::Stop {
                    answer: "script exhausted".into(),
                }
            } else {
                script.remove(0)
            };
            Decision::new(action, "scripted")
        }
    }

    /// Always chooses the same action.
    struct ConstantDecider(Action);

    #[async_trait]
    impl DecisionProcedure for ConstantDecider {
        async fn decide(&self, _ctx: DecisionContext<'_>) -> Decision {
            Decision::new(self.0.clone(), "constant")
        }
    }

    struct StubRetriever {
        fragments: Vec<ContextFragment>,
        fail_first: AtomicUsize,
    }

    impl StubRetriever {
        fn ok(fragments: Vec<ContextFragment>) -> Self {
            Self {
                fragments,
                fail_first: AtomicUsize::new(0),
            }
        }

        fn failing_first(fragments: Vec<ContextFragment>, failures: usize) -> Self {
            Self {
                fragments,
                fail_first: AtomicUsize::new(failures),
            }
        }
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn inspect_context(
            &self,
            _question: &str,
            limit: usize,
        ) -> Result<Vec<ContextFragment>, UpstreamError> {
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(UpstreamError::unavailable("retriever", "connection refused"));
            }
            Ok(self.fragments.iter().take(limit).cloned().collect())
        }
    }

    struct StubChat {
        text: String,
    }

    #[async_trait]
    impl ChatHead for StubChat {
        async fn draft_answer(
            &self,
            _question: &str,
            fragments: &[ContextFragment],
        ) -> Result<DraftAnswer, UpstreamError> {
            Ok(DraftAnswer {
                text: self.text.clone(),
                fragments_used: fragments.to_vec(),
            })
        }
    }

    fn fragment(rank: usize, text: &str) -> ContextFragment {
        ContextFragment {
            rank,
            source: "notes.md".into(),
            text: text.into(),
            score: Some(0.9),
        }
    }

    fn registry(retriever: StubRetriever, chat: StubChat) -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new(Arc::new(retriever), Arc::new(chat)))
    }

    fn default_registry() -> Arc<ToolRegistry> {
        registry(
            StubRetriever::ok(vec![fragment(1, "alpha"), fragment(2, "beta")]),
            StubChat {
                text: "drafted answer".into(),
            },
        )
    }

    #[tokio::test]
    async fn stop_on_first_decision_leaves_empty_trace() {
        let decider = ScriptedDecider::new(vec![Action::Stop {
            answer: "direct answer".into(),
        }]);
        let result = ManagerLoop::new(Arc::new(decider), default_registry())
            .run("q", 8)
            .await;

        assert_eq!(result.answer, "direct answer");
        assert_eq!(result.state, RunState::Stopped);
        assert!(result.trace.is_empty());
    }

    #[tokio::test]
    async fn example_run_inspect_draft_draft_stop() {
        // B=4, decisions = [inspect_context, draft_answer, draft_answer, stop]
        // → 3 trace entries; the stop text wins.
        let decider = ScriptedDecider::new(vec![
            Action::InspectContext { limit: None },
            Action::DraftAnswer,
            Action::DraftAnswer,
            Action::Stop {
                answer: "final from stop".into(),
            },
        ]);
        let result = ManagerLoop::new(Arc::new(decider), default_registry())
            .with_budget(4)
            .run("q", 8)
            .await;

        assert_eq!(result.state, RunState::Stopped);
        assert_eq!(result.answer, "final from stop");
        assert_eq!(result.trace.len(), 3);
        assert_eq!(result.trace[0].tool, INSPECT_CONTEXT);
        assert_eq!(result.trace[1].tool, DRAFT_ANSWER);
        assert_eq!(result.trace[0].step, 1);
        assert_eq!(result.trace[2].step, 3);
        // Latest retrieval and draft context are both surfaced.
        assert_eq!(result.fragments.len(), 2);
        assert_eq!(result.draft_fragments.len(), 2);
    }

    #[tokio::test]
    async fn always_drafting_exhausts_the_budget() {
        for budget in 1..=6u32 {
            let result = ManagerLoop::new(
                Arc::new(ConstantDecider(Action::DraftAnswer)),
                default_registry(),
            )
            .with_budget(budget)
            .run("q", 8)
            .await;

            assert_eq!(result.state, RunState::Exhausted);
            assert_eq!(result.trace.len(), budget as usize);
            assert_eq!(result.answer, "drafted answer");
        }
    }

    #[tokio::test]
    async fn exhaustion_without_draft_surfaces_fragments() {
        // B=2, decisions = [inspect_context, inspect_context].
        let decider = ConstantDecider(Action::InspectContext { limit: None });
        let result = ManagerLoop::new(Arc::new(decider), default_registry())
            .with_budget(2)
            .run("q", 8)
            .await;

        assert_eq!(result.state, RunState::Exhausted);
        assert_eq!(result.trace.len(), 2);
        assert!(result.answer.contains("No draft answer was produced"));
        assert!(result.answer.contains("alpha"));
        assert!(result.answer.contains("beta"));
        assert!(result.draft_fragments.is_empty());
    }

    #[tokio::test]
    async fn exhaustion_with_nothing_at_all_is_still_non_empty() {
        let registry = registry(
            StubRetriever::ok(vec![]),
            StubChat { text: String::new() },
        );
        let decider = ConstantDecider(Action::InspectContext { limit: None });
        let result = ManagerLoop::new(Arc::new(decider), registry)
            .with_budget(2)
            .run("q", 8)
            .await;

        assert_eq!(result.state, RunState::Exhausted);
        assert!(!result.answer.is_empty());
    }

    #[tokio::test]
    async fn tool_failure_is_traced_and_the_run_degrades_gracefully() {
        let registry = registry(
            StubRetriever::failing_first(vec![fragment(1, "alpha")], 1),
            StubChat {
                text: "recovered answer".into(),
            },
        );
        let decider = ScriptedDecider::new(vec![
            Action::InspectContext { limit: None },
            Action::DraftAnswer,
            Action::Stop {
                answer: "recovered answer".into(),
            },
        ]);
        let result = ManagerLoop::new(Arc::new(decider), registry)
            .with_budget(4)
            .run("q", 8)
            .await;

        assert_eq!(result.state, RunState::Stopped);
        assert_eq!(result.answer, "recovered answer");
        assert_eq!(result.trace.len(), 2);
        // The failed step is visible in the trace, not silently skipped.
        assert!(result.trace[0].summary.starts_with("FAILED:"));
        assert!(result.trace[0].summary.contains("connection refused"));
    }

    #[tokio::test]
    async fn decision_limit_overrides_run_limit() {
        let decider = ScriptedDecider::new(vec![
            Action::InspectContext { limit: Some(1) },
            Action::Stop {
                answer: "done".into(),
            },
        ]);
        let result = ManagerLoop::new(Arc::new(decider), default_registry())
            .run("q", 8)
            .await;

        assert_eq!(result.fragments.len(), 1);
    }

    #[tokio::test]
    async fn identical_inputs_produce_identical_results() {
        let make = || {
            ManagerLoop::new(
                Arc::new(ScriptedDecider::new(vec![
                    Action::InspectContext { limit: None },
                    Action::DraftAnswer,
                    Action::Stop {
                        answer: "same".into(),
                    },
                ])),
                default_registry(),
            )
        };

        let first = make().run("q", 8).await;
        let second = make().run("q", 8).await;

        assert_eq!(first.answer, second.answer);
        assert_eq!(first.state, second.state);
        assert_eq!(first.trace, second.trace);
        assert_eq!(first.fragments, second.fragments);
    }

    #[tokio::test]
    async fn zero_budget_run_terminates_immediately() {
        // Degenerate configuration: the loop never asks the decider.
        let decider = ConstantDecider(Action::DraftAnswer);
        let result = ManagerLoop::new(Arc::new(decider), default_registry())
            .with_budget(0)
            .run("q", 8)
            .await;

        assert_eq!(result.state, RunState::Exhausted);
        assert!(result.trace.is_empty());
        assert!(!result.answer.is_empty());
    }
}
