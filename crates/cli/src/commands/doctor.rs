//! `labdesk doctor` — Probe the three upstream services.

use labdesk_clients::{ChatClient, GenerateClient, RetrieverClient};
use labdesk_config::AppConfig;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Labdesk Doctor");
    println!("==============\n");

    let mut issues = 0;

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Configuration valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Configuration invalid: {e}");
            return Err(e.into());
        }
    };

    let retriever = RetrieverClient::with_timeout(&config.upstreams.retriever_url, PROBE_TIMEOUT);
    if retriever.health_check().await {
        println!("  ok    Retriever reachable at {}", config.upstreams.retriever_url);
    } else {
        println!("  FAIL  Retriever unreachable at {}", config.upstreams.retriever_url);
        issues += 1;
    }

    let chat = ChatClient::with_timeout(&config.upstreams.chat_url, PROBE_TIMEOUT);
    if chat.health_check().await {
        println!("  ok    Chat Head reachable at {}", config.upstreams.chat_url);
    } else {
        println!("  FAIL  Chat Head unreachable at {}", config.upstreams.chat_url);
        issues += 1;
    }

    let generator = GenerateClient::with_timeout(&config.upstreams.generate_url, PROBE_TIMEOUT);
    match generator.health_check().await {
        Ok(true) => println!("  ok    Generator reachable at {}", config.upstreams.generate_url),
        _ => {
            println!("  FAIL  Generator unreachable at {}", config.upstreams.generate_url);
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
