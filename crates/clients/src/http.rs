//! Shared request plumbing for the upstream clients.

use labdesk_core::error::UpstreamError;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Build a reqwest client with the per-call timeout baked in.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

/// POST a JSON payload and parse a JSON body back.
///
/// Failure mapping: connect errors and timeouts are `Unavailable`;
/// a non-2xx status or a non-JSON body is `Contract`.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    payload: &Value,
) -> std::result::Result<Value, UpstreamError> {
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await
        .map_err(|e| UpstreamError::unavailable(service, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(service, %status, body = %body, "Upstream returned error status");
        return Err(UpstreamError::contract(
            service,
            format!("status {status}: {body}"),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| UpstreamError::contract(service, format!("non-JSON body: {e}")))
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
