//! Query service entry point.
//!
//! Loads configuration, seeds the in-memory column store and serves the
//! query routes until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gator_query::{http, MemoryStore, QueryOrchestrator, Result, ServiceConfig};

/// Serve time-range queries over pre-aggregated metrics.
#[derive(Parser, Debug)]
#[command(name = "gator-query", version)]
struct Args {
    /// TOML configuration file.
    #[arg(long, env = "GATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on; overrides the configuration file.
    #[arg(long, env = "GATOR_LISTEN")]
    listen: Option<SocketAddr>,

    /// JSON fixture used to seed the in-memory store; overrides the configuration file.
    #[arg(long, env = "GATOR_FIXTURE")]
    fixture: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => ServiceConfig::from_toml_file(path)?,
        None => ServiceConfig::new(),
    };
    if let Some(addr) = args.listen {
        config = config.with_listen_addr(addr);
    }
    if let Some(ref path) = args.fixture {
        config = config.with_fixture_path(path);
    }
    config.validate()?;
    debug!("\n{}", config.to_string_pretty());

    let store = Arc::new(MemoryStore::new());
    match config.fixture_path {
        Some(ref path) => {
            let cells = store.load_fixture(path)?;
            info!(cells, path = %path.display(), "seeded store from fixture");
        }
        None => warn!("no fixture configured; every query will read empty tables"),
    }

    let listen_addr = config.listen_addr;
    let query = QueryOrchestrator::new(store, config);
    let metrics = query.metrics().clone();
    let app = http::router(query);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listen_addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped\n{}", metrics.get_report());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
