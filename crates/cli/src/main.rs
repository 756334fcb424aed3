//! Labdesk CLI — the main entry point.
//!
//! Commands:
//! - `gateway` — Start the HTTP server
//! - `ask`     — Answer a single question and print the JSON outcome
//! - `doctor`  — Probe the three upstream services

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "labdesk",
    about = "Labdesk — a coordination layer for retrieval and grounded chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer one question and print the outcome as JSON
    Ask {
        /// The question to answer
        question: String,

        /// Query mode: rag_only, copilot, manager_auto, or study_guide
        #[arg(short, long, default_value = "copilot")]
        mode: String,

        /// Number of context fragments to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Probe the upstream services
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Ask {
            question,
            mode,
            top_k,
        } => commands::ask::run(&question, &mode, top_k).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
