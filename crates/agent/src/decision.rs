//! The manager's decision procedure.
//!
//! Delegates the choice of next action to the text-generation backend,
//! forcing strict JSON output. The backend is treated as an opaque,
//! possibly unreliable black box: anything it returns that does not
//! parse into one of the three actions is replaced by the default
//! policy, so the loop always makes forward progress.

use async_trait::async_trait;
use labdesk_core::decision::{
    Action, Decision, DecisionContext, DecisionProcedure, default_policy,
};
use labdesk_core::error::DecisionError;
use labdesk_core::generate::{GenerateRequest, TextGenerator};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decision procedure backed by a "manager" model on the generation
/// backend.
pub struct ManagerDecision {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl ManagerDecision {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Build the manager prompt from the running state.
    fn build_prompt(&self, ctx: &DecisionContext<'_>) -> String {
        let history = if ctx.trace.is_empty() {
            "(no previous steps)".to_string()
        } else {
            ctx.trace
                .iter()
                .map(|entry| format!("Step {} via {}: {}", entry.step, entry.tool, entry.summary))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let draft = match ctx.latest_draft {
            Some(d) => format!("Latest draft answer:\n{}", d.text),
            None => "No draft answer exists yet.".to_string(),
        };

        let fragments = match ctx.latest_fragments {
            Some(f) if !f.is_empty() => format!("{} context fragments are available.", f.len()),
            _ => "No context fragments are available.".to_string(),
        };

        format!(
            "You are the manager brain for the Labdesk workspace agent.\n\
             \n\
             The user asked:\n\
             {question}\n\
             \n\
             Remaining tool-call budget: {budget}\n\
             \n\
             Internal tool-call history so far:\n\
             {history}\n\
             \n\
             {draft}\n\
             {fragments}\n\
             \n\
             Tools you can choose:\n\
               - \"inspect_context\": fetch the top-K ranked context fragments from the retriever.\n\
               - \"draft_answer\": ask the chat head for an answer grounded in the fetched fragments.\n\
               - \"stop\": stop calling tools and emit the final answer.\n\
             \n\
             Respond with STRICT JSON, no extra text:\n\
             {{\n\
               \"action\": \"inspect_context\" | \"draft_answer\" | \"stop\",\n\
               \"limit\": <number of fragments, only for inspect_context>,\n\
               \"answer\": \"<the final answer, only for stop>\",\n\
               \"reason\": \"short explanation\"\n\
             }}",
            question = ctx.question,
            budget = ctx.remaining_budget,
            history = history,
            draft = draft,
            fragments = fragments,
        )
    }

    /// Parse the backend's raw output into a decision.
    fn parse_choice(&self, raw: &str) -> Result<Decision, DecisionError> {
        let trimmed = extract_json_object(raw)
            .ok_or_else(|| DecisionError::Malformed(format!("no JSON object in: {raw}")))?;

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| DecisionError::Malformed(format!("invalid JSON: {e}")))?;

        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let action = match value.get("action").and_then(Value::as_str) {
            Some("inspect_context") => Action::InspectContext {
                limit: value
                    .get("limit")
                    .and_then(Value::as_u64)
                    .map(|l| l as usize)
                    .filter(|l| *l > 0),
            },
            Some("draft_answer") => Action::DraftAnswer,
            Some("stop") => {
                let answer = value
                    .get("answer")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                if answer.is_empty() {
                    return Err(DecisionError::Malformed(
                        "stop decision without answer text".into(),
                    ));
                }
                Action::Stop {
                    answer: answer.to_string(),
                }
            }
            other => {
                return Err(DecisionError::Malformed(format!(
                    "unknown action: {other:?}"
                )));
            }
        };

        Ok(Decision::new(action, reason))
    }
}

#[async_trait]
impl DecisionProcedure for ManagerDecision {
    async fn decide(&self, ctx: DecisionContext<'_>) -> Decision {
        // Contract: never request a tool invocation with an empty budget.
        if ctx.remaining_budget == 0 {
            let answer = ctx
                .latest_draft
                .map(|d| d.text.clone())
                .unwrap_or_else(|| "The step budget was exhausted before an answer could be drafted.".to_string());
            return Decision::new(Action::Stop { answer }, "Budget exhausted.");
        }

        let prompt = self.build_prompt(&ctx);
        let request = GenerateRequest::new(&self.model, prompt)
            .with_temperature(0.1)
            .with_max_tokens(256);

        let raw = match self.generator.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Reasoning backend unreachable, applying default policy");
                return default_policy(&ctx, "Reasoning backend unavailable.");
            }
        };

        match self.parse_choice(&raw) {
            Ok(decision) => {
                debug!(action = ?decision.action.tool_name(), "Manager decided");
                decision
            }
            Err(e) => {
                warn!(error = %e, "Malformed manager choice, applying default policy");
                default_policy(&ctx, "Manager choice was malformed.")
            }
        }
    }
}

/// Pull the outermost `{ … }` object out of sloppy model output.
///
/// Models occasionally wrap their JSON in prose or code fences; trim to
/// the first `{` and the last `}` before parsing.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
