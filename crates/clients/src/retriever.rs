//! Study RAG retriever client.
//!
//! Calls `POST {base}/query` with `{"question", "k"}` and normalises the
//! response into [`ContextFragment`]s. Deployed retrievers disagree on
//! field names, so normalisation tolerates several shapes:
//!
//! - fragment list under `chunks`, `retrieved`, or `results`
//! - text under `content`, `text`, `page_content`, or `metadata.text`
//! - source under `source`, `metadata.source`, or `metadata.file_name`
//! - score under `score` or `similarity`

use async_trait::async_trait;
use labdesk_core::error::UpstreamError;
use labdesk_core::fragment::ContextFragment;
use labdesk_core::tool::Retriever;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::http::{build_client, endpoint, post_json};

const SERVICE: &str = "retriever";

/// HTTP client for the document-retrieval upstream.
pub struct RetrieverClient {
    base_url: String,
    client: reqwest::Client,
}

impl RetrieverClient {
    /// Create a client against the given base URL with a 60s timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(60))
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
impl Retriever for RetrieverClient {
    async fn inspect_context(
        &self,
        question: &str,
        limit: usize,
    ) -> std::result::Result<Vec<ContextFragment>, UpstreamError> {
        let url = endpoint(&self.base_url, "/query");
        let payload = json!({ "question": question, "k": limit });

        debug!(limit, "Querying retriever");
        let body = post_json(&self.client, SERVICE, &url, &payload).await?;

        let fragments = normalize_fragments(&body, limit);
        debug!(count = fragments.len(), "Retriever returned fragments");
        Ok(fragments)
    }
}

/// Normalise a retrieval response body into at most `limit` fragments.
pub(crate) fn normalize_fragments(body: &Value, limit: usize) -> Vec<ContextFragment> {
    let raw = body
        .get("chunks")
        .or_else(|| body.get("retrieved"))
        .or_else(|| body.get("results"))
        .or_else(|| body.get("fragments"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    raw.iter()
        .take(limit)
        .enumerate()
        .map(|(i, item)| normalize_item(i + 1, item))
        .collect()
}

fn normalize_item(rank: usize, item: &Value) -> ContextFragment {
    let metadata = item.get("metadata").cloned().unwrap_or(Value::Null);

    let text = item
        .get("content")
        .or_else(|| item.get("text"))
        .or_else(|| item.get("page_content"))
        .or_else(|| metadata.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let source = item
        .get("source")
        .or_else(|| metadata.get("source"))
        .or_else(|| metadata.get("file_name"))
        .and_then(Value::as_str)
        .unwrap_or("chunk")
        .to_string();

    let score = item
        .get("score")
        .or_else(|| item.get("similarity"))
        .and_then(Value::as_f64);

    ContextFragment {
        rank,
        source,
        text,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_chunks_shape() {
        let body = json!({
            "chunks": [
                { "content": "alpha", "source": "a.md", "score": 0.9 },
                { "text": "beta", "metadata": { "file_name": "b.md" } },
            ]
        });
        let fragments = normalize_fragments(&body, 8);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].rank, 1);
        assert_eq!(fragments[0].text, "alpha");
        assert_eq!(fragments[0].source, "a.md");
        assert_eq!(fragments[0].score, Some(0.9));
        assert_eq!(fragments[1].source, "b.md");
        assert_eq!(fragments[1].score, None);
    }

    #[test]
    fn normalizes_retrieved_and_results_shapes() {
        let retrieved = json!({ "retrieved": [{ "page_content": "x" }] });
        let results = json!({ "results": [{ "metadata": { "text": "y" } }] });
        assert_eq!(normalize_fragments(&retrieved, 8)[0].text, "x");
        assert_eq!(normalize_fragments(&results, 8)[0].text, "y");
    }

    #[test]
    fn missing_source_falls_back_to_chunk() {
        let body = json!({ "chunks": [{ "content": "no source here" }] });
        assert_eq!(normalize_fragments(&body, 8)[0].source, "chunk");
    }

    #[test]
    fn respects_limit() {
        let items: Vec<Value> = (0..10).map(|i| json!({ "text": format!("t{i}") })).collect();
        let body = json!({ "chunks": items });
        let fragments = normalize_fragments(&body, 3);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[2].rank, 3);
    }

    #[test]
    fn unknown_shape_yields_empty() {
        let body = json!({ "answer": "no list at all" });
        assert!(normalize_fragments(&body, 8).is_empty());
    }

    mod wire {
        use crate::retriever::RetrieverClient;
        use labdesk_core::error::UpstreamError;
        use labdesk_core::tool::Retriever;
        use serde_json::json;
        use std::time::Duration;
        use wiremock::matchers::{body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn inspect_context_sends_question_and_k() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/query"))
                .and(body_partial_json(json!({ "question": "what is entropy?", "k": 4 })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "chunks": [
                        { "content": "Entropy measures disorder.", "source": "thermo.md", "score": 0.95 }
                    ]
                })))
                .mount(&server)
                .await;

            let client = RetrieverClient::new(server.uri());
            let fragments = client.inspect_context("what is entropy?", 4).await.unwrap();
            assert_eq!(fragments.len(), 1);
            assert_eq!(fragments[0].source, "thermo.md");
        }

        #[tokio::test]
        async fn error_status_is_contract_failure() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/query"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let client = RetrieverClient::new(server.uri());
            let err = client.inspect_context("q", 4).await.unwrap_err();
            assert!(matches!(err, UpstreamError::Contract { .. }));
            assert_eq!(err.service(), "retriever");
        }

        #[tokio::test]
        async fn timeout_is_unavailable() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/query"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({ "chunks": [] }))
                        .set_delay(Duration::from_secs(5)),
                )
                .mount(&server)
                .await;

            let client = RetrieverClient::with_timeout(server.uri(), Duration::from_millis(100));
            let err = client.inspect_context("q", 4).await.unwrap_err();
            assert!(matches!(err, UpstreamError::Unavailable { .. }));
        }
    }
}
