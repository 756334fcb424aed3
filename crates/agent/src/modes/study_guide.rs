//! Study-guide mode: retrieve context, generate a structured markdown
//! guide, persist it, and hand back a download URL.

use crate::modes::context_block;
use labdesk_core::error::{Error, Result};
use labdesk_core::fragment::ContextFragment;
use labdesk_core::generate::{GenerateRequest, TextGenerator};
use labdesk_core::run::TraceEntry;
use labdesk_core::tool::{INSPECT_CONTEXT, Retriever};
use std::path::Path;
use tracing::info;

/// Maximum length of a guide filename slug, in characters.
const SLUG_MAX_CHARS: usize = 80;

/// What a study-guide run produced.
pub struct GuideOutcome {
    /// The guide itself, as markdown.
    pub guide: String,
    pub fragments: Vec<ContextFragment>,
    pub trace: Vec<TraceEntry>,
    /// Gateway-relative URL of the saved markdown file.
    pub markdown_url: String,
}

/// Run a study-guide query and persist the result under `guides_dir`.
pub async fn run(
    retriever: &dyn Retriever,
    generator: &dyn TextGenerator,
    model: &str,
    question: &str,
    top_k: usize,
    guides_dir: &Path,
) -> Result<GuideOutcome> {
    let fragments = retriever.inspect_context(question, top_k).await?;
    let context = if fragments.is_empty() {
        "(no context found)".to_string()
    } else {
        context_block(&fragments)
    };

    let prompt = guide_prompt(question, &context);
    let request = GenerateRequest::new(model, prompt)
        .with_temperature(0.3)
        .with_max_tokens(1024);
    let guide = generator.generate(request).await?;

    let file_name = format!("{}.md", slugify(question));
    let path = guides_dir.join(&file_name);
    tokio::fs::create_dir_all(guides_dir)
        .await
        .map_err(|e| Error::GuidePersistence(format!("create {}: {e}", guides_dir.display())))?;
    tokio::fs::write(&path, &guide)
        .await
        .map_err(|e| Error::GuidePersistence(format!("write {}: {e}", path.display())))?;
    info!(path = %path.display(), "Saved study guide");

    let trace = vec![
        TraceEntry::new(
            1,
            INSPECT_CONTEXT,
            &format!("Fetched top-{top_k} context fragments."),
        ),
        TraceEntry::new(
            2,
            "study_guide",
            "Generated a structured study guide from the retrieved context.",
        ),
        TraceEntry::new(3, "file_export", "Saved the guide as markdown."),
    ];

    Ok(GuideOutcome {
        guide,
        fragments,
        trace,
        markdown_url: format!("/guides/{file_name}"),
    })
}

fn guide_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a strict but helpful study planner.\n\n\
         The user wants a study guide for:\n{question}\n\n\
         Here is the context from their document library:\n{context}\n\n\
         Build a clear, structured study guide that stays grounded in the context.\n\
         Requirements:\n\
         - Use markdown.\n\
         - Start with a short overview.\n\
         - Then create 5-10 sections with headings.\n\
         - Under each section, list concrete bullet points, exercises, or checkpoints.\n\
         - Do NOT invent facts that are not supported by the context."
    )
}

/// Turn a question into a filesystem-safe slug: lowercase alphanumerics
/// with single dashes between runs, capped at [`SLUG_MAX_CHARS`].
fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return "guide".to_string();
    }
    slug.chars().take(SLUG_MAX_CHARS).collect()
}
