//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::session::PageSession;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<PageSession>,
}

/// Build the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Volume control (popup contract)
        .route("/volume", get(super::handlers::get_volume))
        .route("/volume", post(super::handlers::set_volume))
        // Session diagnostics
        .route("/session", get(super::handlers::get_session))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Developer harness: drive the page model
        .route("/page/element", post(super::handlers::insert_element))
        .route("/page/element/:element_id", delete(super::handlers::remove_element))
        .route("/page/gesture", post(super::handlers::dispatch_gesture))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server
pub async fn run(port: u16, ctx: AppContext) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
