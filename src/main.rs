//! Arena Game Server
//!
//! Authoritative simulation server binary: binds the WebSocket listener,
//! spawns the simulation task, and runs until ctrl-c.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arena::network::server::{GameServer, ServerConfig};
use arena::VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Ok(addr) = std::env::var("ARENA_ADDR") {
        config.bind_addr = addr.parse().context("parse ARENA_ADDR")?;
    }

    info!("Arena Server v{}", VERSION);
    info!("Tick Rate: {} Hz", config.tick_rate);

    let server = GameServer::new(config);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
