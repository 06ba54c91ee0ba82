//! Headless game server (default binary).
//!
//! Serves one independent session per TCP connection using the JSON line protocol in
//! [`arcade_blocks::adapter`]. Configure with `ARCADE_BLOCKS_*` variables and filter
//! logs with `RUST_LOG`.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arcade_blocks::adapter::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        seed = config.seed,
        "arcade_blocks_startup"
    );

    tokio::select! {
        result = run_server(config, None) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown_requested");
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
