//! Copilot mode: retrieval view plus a single grounded-chat call.

use crate::modes::summarise_prompt;
use labdesk_core::error::Result;
use labdesk_core::fragment::{ContextFragment, DraftAnswer};
use labdesk_core::generate::{GenerateRequest, TextGenerator};
use labdesk_core::tool::{ChatHead, Retriever};
use tracing::info;

/// Run a copilot query.
///
/// Retrieves fragments first (so the caller can show what the question
/// matched), then asks the Chat Head for a grounded draft. The draft's
/// text is the answer; if the Chat Head comes back empty and fragments
/// exist, the text generator summarises them instead.
pub async fn run(
    retriever: &dyn Retriever,
    chat: &dyn ChatHead,
    generator: &dyn TextGenerator,
    model: &str,
    question: &str,
    top_k: usize,
) -> Result<(String, Vec<ContextFragment>, DraftAnswer)> {
    let fragments = retriever.inspect_context(question, top_k).await?;
    let draft = chat.draft_answer(question, &fragments).await?;
    info!(
        fragments = fragments.len(),
        draft_len = draft.text.len(),
        "Copilot upstreams answered"
    );

    let answer = if !draft.text.is_empty() {
        draft.text.clone()
    } else if !fragments.is_empty() {
        let request = GenerateRequest::new(model, summarise_prompt(question, &fragments))
            .with_temperature(0.2)
            .with_max_tokens(512);
        generator.generate(request).await?
    } else {
        String::new()
    };

    Ok((answer, fragments, draft))
}
