//! `labdesk ask` — Answer one question and print the outcome as JSON.

use labdesk_agent::{Mode, WorkspaceService};
use labdesk_clients::{ChatClient, GenerateClient, RetrieverClient};
use labdesk_config::AppConfig;
use std::sync::Arc;

pub async fn run(
    question: &str,
    mode: &str,
    top_k: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mode: Mode = mode.parse()?;

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

    let service = WorkspaceService::new(retriever, chat, generator, &config);
    let outcome = service.ask(question, top_k, mode).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
