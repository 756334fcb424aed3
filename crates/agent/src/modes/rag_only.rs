//! Retrieval-only mode: fetch fragments, then summarise them.

use crate::modes::summarise_prompt;
use labdesk_core::error::Result;
use labdesk_core::fragment::ContextFragment;
use labdesk_core::generate::{GenerateRequest, TextGenerator};
use labdesk_core::tool::Retriever;
use tracing::info;

/// Run a retrieval-only query.
///
/// Fetches up to `top_k` fragments and, when any were found, asks the
/// text generator for a short grounded summary. With no fragments the
/// answer stays empty; the caller decides how to present that.
pub async fn run(
    retriever: &dyn Retriever,
    generator: &dyn TextGenerator,
    model: &str,
    question: &str,
    top_k: usize,
) -> Result<(String, Vec<ContextFragment>)> {
    let fragments = retriever.inspect_context(question, top_k).await?;
    info!(count = fragments.len(), "Retrieved context fragments");

    if fragments.is_empty() {
        return Ok((String::new(), fragments));
    }

    let request = GenerateRequest::new(model, summarise_prompt(question, &fragments))
        .with_temperature(0.2)
        .with_max_tokens(512);
    let answer = generator.generate(request).await?;

    Ok((answer, fragments))
}
