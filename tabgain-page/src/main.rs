//! Tabgain page engine - Main entry point
//!
//! Hosts one page's amplification session and exposes the HTTP/SSE
//! command surface the popup collaborator drives.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabgain_page::api::{self, AppContext};
use tabgain_page::db;
use tabgain_page::page::Document;
use tabgain_page::PageSession;

/// Command-line arguments for tabgain-page
#[derive(Parser, Debug)]
#[command(name = "tabgain-page")]
#[command(about = "Per-page volume amplification engine for tabgain")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "TABGAIN_PORT")]
    port: u16,

    /// Hostname of the site this page serves (persistence key)
    #[arg(long, env = "TABGAIN_HOSTNAME")]
    hostname: String,

    /// Path to the site-volume database
    #[arg(short, long)]
    database: Option<String>,

    /// Simulate a page without audio-processing capability
    #[arg(long)]
    no_audio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabgain_page=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting tabgain page engine on port {}", args.port);
    info!("Site hostname: {}", args.hostname);

    // Resolve and open the site-volume store
    let db_path = tabgain_common::config::resolve_database_path(
        args.database.as_deref(),
        "TABGAIN_DB",
        Some("database"),
    )
    .context("Failed to resolve database path")?;
    info!("Site-volume store: {}", db_path.display());

    let pool = db::open_pool(&db_path)
        .await
        .context("Failed to open site-volume store")?;
    db::initialize_database(&pool)
        .await
        .context("Failed to initialize site-volume store")?;

    // Seed the target volume for this site (read once; never written)
    let seed = db::seed_volume(&pool, &args.hostname).await;
    info!("Seed volume for {}: {:.0}%", args.hostname, seed * 100.0);

    // Build and start the page session
    let document = Arc::new(Document::new(&args.hostname).with_audio_support(!args.no_audio));
    let session = Arc::new(PageSession::new(Arc::clone(&document), seed));
    session.start().await;
    info!("Page session started");

    // Build the application router
    let app = api::create_router(AppContext {
        session: Arc::clone(&session),
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Page unload: release the context and restore element state
    session.shutdown().await;
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
