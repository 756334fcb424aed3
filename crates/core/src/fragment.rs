//! Retrieval fragments and drafted answers — the data the two tools
//! produce.
//!
//! Both types are read-only once produced: the manager loop stores the
//! most recent set and never mutates it.

use serde::{Deserialize, Serialize};

/// One ranked piece of retrieval context returned by the Retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFragment {
    /// 1-based position in the ranked result list.
    pub rank: usize,

    /// Where the fragment came from (file name, document id, …).
    pub source: String,

    /// The fragment text itself.
    pub text: String,

    /// Relevance score, when the upstream reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ContextFragment {
    /// Render the fragment the way it is surfaced to users in fallback
    /// answers: `[rank] (source) text`.
    pub fn render(&self) -> String {
        format!("[{}] ({}) {}", self.rank, self.source, self.text)
    }
}

/// An answer drafted by the Chat Head, together with the subset of
/// fragments it actually consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftAnswer {
    /// The drafted answer text.
    pub text: String,

    /// Fragments the Chat Head reported using for grounding.
    #[serde(default)]
    pub fragments_used: Vec<ContextFragment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_render_includes_rank_and_source() {
        let frag = ContextFragment {
            rank: 2,
            source: "notes.md".into(),
            text: "Entropy never decreases.".into(),
            score: Some(0.91),
        };
        let rendered = frag.render();
        assert!(rendered.starts_with("[2] (notes.md)"));
        assert!(rendered.contains("Entropy"));
    }

    #[test]
    fn draft_answer_serde_defaults_fragments() {
        let draft: DraftAnswer = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(draft.text, "hi");
        assert!(draft.fragments_used.is_empty());
    }
}
