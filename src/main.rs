//! WebSocket chat gateway.
//!
//! Terminates device WebSocket connections, authenticates each device, and
//! relays chat requests to an OpenAI-compatible backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                    CHAT GATEWAY                      │
//!                     │                                                      │
//!   Device frames     │  ┌─────────┐   ┌──────────┐   ┌────────────┐         │
//!   ──────────────────┼─▶│  http   │──▶│ session  │──▶│ normalizer │         │
//!                     │  │ upgrade │   │ (auth)   │   └─────┬──────┘         │
//!                     │  └─────────┘   └────▲─────┘         │                │
//!                     │                     │               ▼                │
//!   Reply frames      │                     │        ┌─────────────┐         │
//!   ◀─────────────────┼─────────────────────┴────────│ worker pool │─────────┼──▶ Chat
//!                     │                              │  + backend  │◀────────┼─── completions
//!                     │                              └─────────────┘         │
//!                     │  ┌────────────────────────────────────────────────┐  │
//!                     │  │ config · observability · lifecycle · net/tls   │  │
//!                     │  └────────────────────────────────────────────────┘  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use chat_gateway::backend::OpenAiBackend;
use chat_gateway::config::{load_config, DEFAULT_CONFIG_PATH};
use chat_gateway::http::{bind_listener, GatewayServer};
use chat_gateway::lifecycle::{signals, Shutdown};
use chat_gateway::net::tls::load_tls_config;
use chat_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "chat-gateway")]
#[command(about = "WebSocket gateway between devices and a chat-completion backend", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "chat-gateway starting"
    );

    if config.gateway.openai.api_key_is_placeholder() {
        tracing::warn!("OpenAI API key is not configured; backend requests will fail");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let backend = Arc::new(OpenAiBackend::new(&config.gateway.openai)?);

    let tls = match &config.server.tls {
        Some(tls) => Some(load_tls_config(tls).await?),
        None => None,
    };

    let listener = bind_listener(&config.server).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = GatewayServer::new(config, backend);
    match tls {
        Some(tls) => server.run_tls(listener, tls, shutdown.subscribe()).await?,
        None => server.run(listener, shutdown.subscribe()).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
