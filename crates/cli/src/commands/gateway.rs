//! `labdesk gateway` — Start the HTTP API server.

use labdesk_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Labdesk Gateway");
    println!("   Listening:  {}", config.gateway.bind_addr());
    println!("   Retriever:  {}", config.upstreams.retriever_url);
    println!("   Chat Head:  {}", config.upstreams.chat_url);
    println!("   Generator:  {}", config.upstreams.generate_url);

    labdesk_gateway::start(config).await?;

    Ok(())
}
