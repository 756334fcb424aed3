//! HTTP API gateway for Labdesk.
//!
//! Exposes the workspace query endpoint, a health check, and static
//! serving of saved study guides.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use labdesk_agent::{Mode, QueryOutcome, WorkspaceService};
use labdesk_clients::{ChatClient, GenerateClient, RetrieverClient};
use labdesk_core::error::Error;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Build the Axum router with all gateway routes.
///
/// `guides_dir` is served read-only under `/guides` so saved study
/// guides can be downloaded via the URL the query outcome reports.
pub fn build_router(service: Arc<WorkspaceService>, guides_dir: &Path) -> Router {
    Router::new()
        .route("/api/query", post(query_handler))
        .route("/healthz", get(health_handler))
        .nest_service("/guides", ServeDir::new(guides_dir))
        .with_state(service)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: labdesk_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.gateway.bind_addr();

    let retriever = Arc::new(RetrieverClient::with_timeout(
        &config.upstreams.retriever_url,
        config.upstreams.retriever_timeout(),
    ));
    let chat = Arc::new(ChatClient::with_timeout(
        &config.upstreams.chat_url,
        config.upstreams.chat_timeout(),
    ));
    let generator = Arc::new(GenerateClient::with_timeout(
        &config.upstreams.generate_url,
        config.upstreams.generate_timeout(),
    ));

    let guides_dir = config.agent.guides_dir.clone();
    let service = Arc::new(WorkspaceService::new(retriever, chat, generator, &config));
    let app = build_router(service, &guides_dir);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `POST /api/query` request body.
#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,

    /// Number of context fragments to retrieve (defaults from config)
    #[serde(default)]
    top_k: Option<usize>,

    /// Defaults to copilot
    #[serde(default)]
    mode: Option<Mode>,
}

async fn query_handler(
    State(service): State<Arc<WorkspaceService>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryOutcome>, GatewayError> {
    let mode = request.mode.unwrap_or_default();
    let outcome = service
        .ask(&request.question, request.top_k, mode)
        .await
        .map_err(GatewayError)?;
    Ok(Json(outcome))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "labdesk",
    }))
}

/// Wraps a domain error so it can become an HTTP response: upstream
/// failures map to 502, everything else to 500.
struct GatewayError(Error);

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(error = %self.0, status = %status, "Query failed");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
