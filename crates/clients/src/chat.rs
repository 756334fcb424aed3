//! Lab Copilot chat-head client.
//!
//! Calls `POST {base}/chat` with `{"question", "fragments", "top_k"}`.
//! The copilot may run its own retrieval internally; `top_k` is its
//! result-count hint. The response reports which fragments the copilot
//! actually used (tolerating the same item shapes as the retriever).

use async_trait::async_trait;
use labdesk_core::error::UpstreamError;
use labdesk_core::fragment::{ContextFragment, DraftAnswer};
use labdesk_core::tool::ChatHead;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::http::{build_client, endpoint, post_json};
use crate::retriever::normalize_fragments;

const SERVICE: &str = "chat-head";

/// How many fragments to ask the copilot for when the caller supplies
/// none of its own.
const DEFAULT_TOP_K: usize = 8;

/// HTTP client for the grounded-chat upstream.
pub struct ChatClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a client against the given base URL with a 120s timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: build_client(timeout),
        }
    }

    /// Probe the service. Used by `labdesk doctor`; any HTTP response
    /// counts as reachable.
    pub async fn health_check(&self) -> bool {
        self.client.get(&self.base_url).send().await.is_ok()
    }
}

#[async_trait]
impl ChatHead for ChatClient {
    async fn draft_answer(
        &self,
        question: &str,
        fragments: &[ContextFragment],
    ) -> std::result::Result<DraftAnswer, UpstreamError> {
        let url = endpoint(&self.base_url, "/chat");
        let top_k = if fragments.is_empty() {
            DEFAULT_TOP_K
        } else {
            fragments.len()
        };
        // An empty fragment set is still a valid call — the copilot can
        // answer from its own grounding.
        let payload = json!({
            "question": question,
            "fragments": fragments,
            "top_k": top_k,
        });

        debug!(top_k, "Requesting draft from chat head");
        let body = post_json(&self.client, SERVICE, &url, &payload).await?;

        let text = body
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let fragments_used = body
            .get("fragments_used")
            .map(|list| normalize_fragments(&json!({ "chunks": list }), usize::MAX))
            .unwrap_or_else(|| normalize_fragments(&body, usize::MAX));

        debug!(
            answer_len = text.len(),
            used = fragments_used.len(),
            "Chat head returned draft"
        );
        Ok(DraftAnswer {
            text,
            fragments_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn draft_answer_parses_answer_and_fragments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({ "question": "why is the sky blue?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Rayleigh scattering.",
                "fragments_used": [
                    { "content": "Blue light scatters more.", "source": "optics.md", "score": 0.8 }
                ]
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        let draft = client.draft_answer("why is the sky blue?", &[]).await.unwrap();
        assert_eq!(draft.text, "Rayleigh scattering.");
        assert_eq!(draft.fragments_used.len(), 1);
        assert_eq!(draft.fragments_used[0].source, "optics.md");
    }

    #[tokio::test]
    async fn chunks_shape_is_tolerated_for_used_fragments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "ok",
                "chunks": [ { "text": "from chunks" } ]
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        let draft = client.draft_answer("q", &[]).await.unwrap();
        assert_eq!(draft.fragments_used.len(), 1);
        assert_eq!(draft.fragments_used[0].text, "from chunks");
    }

    #[tokio::test]
    async fn non_2xx_is_contract_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        let err = client.draft_answer("q", &[]).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Contract { .. }));
        assert_eq!(err.service(), "chat-head");
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        // Nothing listens on this port.
        let client = ChatClient::with_timeout(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
        );
        let err = client.draft_answer("q", &[]).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable { .. }));
    }
}
