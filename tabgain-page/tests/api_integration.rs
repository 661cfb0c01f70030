//! Integration test - HTTP command surface
//!
//! Exercises the popup contract against the real router without a TCP
//! listener (tower oneshot).

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tabgain_page::api::{create_router, AppContext};
use tabgain_page::page::{Document, MediaElement};
use tabgain_page::PageSession;

async fn setup() -> (Arc<Document>, Arc<PageSession>, Router) {
    let document = Arc::new(Document::new("example.com"));
    let session = Arc::new(PageSession::new(Arc::clone(&document), 1.0));
    session.start().await;
    let router = create_router(AppContext {
        session: Arc::clone(&session),
    });
    (document, session, router)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (_doc, _session, router) = setup().await;

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "tabgain_page");
}

#[tokio::test]
async fn test_volume_roundtrip() {
    let (_doc, _session, router) = setup().await;

    let (status, body) = get_json(&router, "/volume").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["volume"], 1.0);

    let (status, body) = post_json(&router, "/volume", json!({ "volume": 3.5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["volume"], 3.5);

    let (_, body) = get_json(&router, "/volume").await;
    assert_eq!(body["volume"], 3.5);
}

#[tokio::test]
async fn test_volume_clamped_and_echoed() {
    let (_doc, _session, router) = setup().await;

    let (status, body) = post_json(&router, "/volume", json!({ "volume": 6.0 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["volume"], 5.0);

    let (status, body) = post_json(&router, "/volume", json!({ "volume": -1.0 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["volume"], 0.0);
}

#[tokio::test]
async fn test_session_status() {
    let (_doc, _session, router) = setup().await;

    let (status, body) = get_json(&router, "/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hostname"], "example.com");
    assert_eq!(body["activated"], false);
    assert_eq!(body["connected_elements"], 0);
}

#[tokio::test]
async fn test_inserted_element_gets_connected() {
    let (_doc, _session, router) = setup().await;

    let (status, body) =
        post_json(&router, "/page/element", json!({ "kind": "video" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["element_id"].is_string());

    // The mutation watcher flushes after its debounce window
    tokio::time::sleep(Duration::from_millis(300)).await;

    let (_, body) = get_json(&router, "/session").await;
    assert_eq!(body["connected_elements"], 1);
}

#[tokio::test]
async fn test_unknown_element_kind_rejected() {
    let (_doc, _session, router) = setup().await;

    let (status, _body) =
        post_json(&router, "/page/element", json!({ "kind": "marquee" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gesture_endpoint_activates_page() {
    let (doc, _session, router) = setup().await;

    let (status, _body) = post_json(&router, "/page/gesture", json!({ "gesture": "click" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc.is_activated());

    let (status, _body) =
        post_json(&router, "/page/gesture", json!({ "gesture": "hover" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_element() {
    let (doc, _session, router) = setup().await;
    let el = doc.insert_media(MediaElement::video());

    let uri = format!("/page/element/{}", el.id());
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Removing again is a 404
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
