//! HTTP request handlers
//!
//! Implements the popup contract (volume get/set with clamp-and-echo)
//! plus diagnostics and the page-model developer harness.

use crate::api::server::AppContext;
use crate::page::{ElementKind, Gesture, MediaElement};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: f32, // gain factor, 1.0 = 100%
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    success: bool,
    volume: f32,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    hostname: String,
    activated: bool,
    context_state: String,
    volume: f32,
    connected_elements: usize,
}

#[derive(Debug, Deserialize)]
pub struct InsertElementRequest {
    kind: String,
    #[serde(default)]
    cross_origin: bool,
}

#[derive(Debug, Serialize)]
pub struct InsertElementResponse {
    success: bool,
    element_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GestureRequest {
    gesture: String,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "tabgain_page".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Volume Endpoints
// ============================================================================

/// GET /volume - Current target volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeResponse> {
    Json(VolumeResponse {
        success: true,
        volume: ctx.session.volume().await,
    })
}

/// POST /volume - Apply a volume request
///
/// Out-of-range values are clamped, never rejected; the applied value
/// is echoed back.
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> Json<VolumeResponse> {
    let applied = ctx.session.set_volume(req.volume).await;
    info!(
        "Volume request {:.0}% -> applied {:.0}%",
        req.volume * 100.0,
        applied * 100.0
    );

    Json(VolumeResponse {
        success: true,
        volume: applied,
    })
}

// ============================================================================
// Session Diagnostics
// ============================================================================

/// GET /session - Session status snapshot
pub async fn get_session(State(ctx): State<AppContext>) -> Json<SessionResponse> {
    let status = ctx.session.status().await;
    Json(SessionResponse {
        hostname: status.hostname,
        activated: status.activated,
        context_state: status.context_state,
        volume: status.target_volume,
        connected_elements: status.connected_elements,
    })
}

// ============================================================================
// Page Harness Endpoints
// ============================================================================

/// POST /page/element - Insert a media element into the page model
pub async fn insert_element(
    State(ctx): State<AppContext>,
    Json(req): Json<InsertElementRequest>,
) -> Result<Json<InsertElementResponse>, (StatusCode, Json<StatusResponse>)> {
    let kind = ElementKind::parse(&req.kind).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: format!("error: unknown element kind '{}'", req.kind),
            }),
        )
    })?;

    let element = match kind {
        ElementKind::Audio => MediaElement::audio(),
        ElementKind::Video => MediaElement::video(),
    };
    let element = if req.cross_origin {
        element.with_cross_origin()
    } else {
        element
    };

    let element = ctx.session.document().insert_media(element);
    info!(element = %element.id(), kind = %kind, "Inserted media element");

    Ok(Json(InsertElementResponse {
        success: true,
        element_id: element.id(),
    }))
}

/// DELETE /page/element/:element_id - Remove an element from the page
pub async fn remove_element(
    State(ctx): State<AppContext>,
    Path(element_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    if ctx.session.document().remove(element_id) {
        Ok(StatusCode::OK)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: format!("error: no element {}", element_id),
            }),
        ))
    }
}

/// POST /page/gesture - Dispatch a user gesture to the page
pub async fn dispatch_gesture(
    State(ctx): State<AppContext>,
    Json(req): Json<GestureRequest>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    let gesture = Gesture::parse(&req.gesture).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: format!("error: unknown gesture '{}'", req.gesture),
            }),
        )
    })?;

    ctx.session.document().dispatch_gesture(gesture);
    Ok(StatusCode::OK)
}
