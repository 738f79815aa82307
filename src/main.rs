//! juked - orchestrator daemon entry point
//!
//! Wires the coordination store, the engine client, the advance monitor
//! and the HTTP API together, then serves until shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use juke::api;
use juke::cache::{AttachmentCache, SqliteAttachmentCache};
use juke::config::{Config, ConfigOverrides};
use juke::engine::HttpAudioEngine;
use juke::events::EventBus;
use juke::playback::{start_monitor, Orchestrator};
use juke::store::{self, SqliteStore};

/// Command-line arguments for juked
#[derive(Parser, Debug)]
#[command(name = "juked")]
#[command(about = "Playback queue orchestrator for a shared-store audio engine")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "JUKE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "JUKE_PORT")]
    port: Option<u16>,

    /// Path to the shared coordination database
    #[arg(short, long, env = "JUKE_DATABASE")]
    database: Option<PathBuf>,

    /// Base URL of the playback engine
    #[arg(long, env = "JUKE_ENGINE_URL")]
    engine_url: Option<String>,

    /// Advance monitor poll interval in seconds
    #[arg(long, env = "JUKE_POLL_INTERVAL")]
    poll_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let overrides = ConfigOverrides {
        port: args.port,
        database_path: args.database.clone(),
        engine_url: args.engine_url.clone(),
        poll_interval_secs: args.poll_interval,
    };
    let config = Config::load(args.config.as_deref(), overrides)
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("juke={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting juke orchestrator on port {}", config.port);
    info!(
        "Coordination database: {}",
        config.database_path.display()
    );
    info!("Engine URL: {}", config.engine_url);

    // One SQLite file backs both the coordination store and the
    // attachment cache.
    let pool = store::sqlite::connect(&config.database_path)
        .await
        .context("Failed to open coordination database")?;
    let store = Arc::new(
        SqliteStore::init(pool.clone())
            .await
            .context("Failed to initialize coordination store")?,
    );
    let cache: Arc<dyn AttachmentCache> = Arc::new(
        SqliteAttachmentCache::init(pool)
            .await
            .context("Failed to initialize attachment cache")?,
    );

    let events = Arc::new(EventBus::new(100));
    let engine = Arc::new(
        HttpAudioEngine::new(&config.engine_url, config.engine_timeout())
            .context("Failed to build engine client")?,
    );

    let orchestrator = Arc::new(Orchestrator::new(
        store,
        engine,
        events.clone(),
        Some(cache.clone()),
    ));
    info!("Orchestrator initialized");

    start_monitor(orchestrator.clone(), config.poll_interval());

    // Build the application router
    let ctx = api::AppContext {
        orchestrator,
        events,
        cache: Some(cache),
    };
    let app = api::router(ctx);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Starting HTTP server on {}", addr);

    // Create and run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
