//! wsbridge: WebSocket-to-HTTP relay gateway.
//!
//! Accepts WebSocket connections, forwards every client frame to a configured
//! HTTP backend, and lets the backend push asynchronous replies (or terminate
//! the session) via a per-session reply URL.

mod backend;
mod config;
mod server;
mod session;
mod transport;

use clap::Parser;
use config::ServerConfig;
use server::BridgeServer;
use std::path::PathBuf;
use tracing::{error, info};

/// wsbridge — WebSocket to HTTP relay gateway
#[derive(Parser, Debug)]
#[command(name = "wsbridge", version, about = "WebSocket to HTTP relay gateway")]
struct Cli {
    /// Listen address (host:port)
    #[arg(short, long)]
    listen_addr: Option<String>,

    /// Path where WebSocket connections are upgraded
    #[arg(long)]
    ws_path: Option<String>,

    /// Backend URL client frames are POSTed to
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Path prefix for per-session reply endpoints
    #[arg(long)]
    reply_path_prefix: Option<String>,

    /// Config file path
    #[arg(long, default_value = "~/.wsbridge/config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::EnvFilter;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting wsbridge");

    // Load server config (file + CLI overrides)
    let config_path = PathBuf::from(&cli.config);
    let server_config = match ServerConfig::load(
        Some(&config_path),
        cli.listen_addr,
        cli.ws_path,
        cli.backend_url,
        cli.reply_path_prefix,
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let bridge = BridgeServer::new(server_config);

    // Run until shutdown signal
    tokio::select! {
        result = bridge.run() => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
        }
    }

    info!("wsbridge stopped");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
