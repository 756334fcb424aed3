//! Pass-through query modes.
//!
//! Unlike manager mode these have no decision logic: each one calls its
//! upstreams a fixed number of times and returns. They share the same
//! seam traits as the manager loop, so tests drive them with the same
//! stubs.

pub mod copilot;
pub mod rag_only;
pub mod study_guide;

use labdesk_core::fragment::ContextFragment;

/// Render fragments as a numbered context block for a generation prompt.
pub(crate) fn context_block(fragments: &[ContextFragment]) -> String {
    fragments
        .iter()
        .map(ContextFragment::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt the generator to summarise retrieved context into a direct answer.
pub(crate) fn summarise_prompt(question: &str, fragments: &[ContextFragment]) -> String {
    format!(
        "The user asked:\n{question}\n\n\
         Here are context snippets from their document library:\n{}\n\n\
         Provide a short, direct answer using ONLY this context.\n\
         If you truly cannot answer from it, say so honestly.",
        context_block(fragments)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_block_numbers_every_fragment() {
        let fragments = vec![
            ContextFragment {
                rank: 1,
                source: "notes.md".into(),
                text: "alpha".into(),
                score: None,
            },
            ContextFragment {
                rank: 2,
                source: "slides.md".into(),
                text: "beta".into(),
                score: None,
            },
        ];
        let block = context_block(&fragments);
        assert!(block.contains("[1]"));
        assert!(block.contains("[2]"));
        assert!(block.contains("alpha"));
    }

    #[test]
    fn summarise_prompt_contains_question_and_context() {
        let fragments = vec![ContextFragment {
            rank: 1,
            source: "notes.md".into(),
            text: "the mitochondria".into(),
            score: None,
        }];
        let prompt = summarise_prompt("what is it?", &fragments);
        assert!(prompt.contains("what is it?"));
        assert!(prompt.contains("the mitochondria"));
        assert!(prompt.contains("ONLY this context"));
    }
}
