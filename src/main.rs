//! Employee directory gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!   Client request   │  trace id ─▶ admission gate ─▶ handlers ─▶ service   │
//!   ─────────────────┼─▶ (http)       (security)       (http)     │         │
//!                    │                                            ▼         │
//!                    │                                     upstream client ─┼──▶ Directory
//!                    │                                  timeout/retry/classify   service
//!   Client response  │                                            │         │
//!   ◀────────────────┼── response.rs (DomainError → status) ◀─────┘         │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use employee_gateway::config;
use employee_gateway::lifecycle::{self, Shutdown};
use employee_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "employee-gateway")]
#[command(about = "Rate-limited, fault-tolerant gateway for the employee directory", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = config::load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "employee-gateway starting"
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        shutdown.trigger();
    });

    lifecycle::startup::start(config, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
