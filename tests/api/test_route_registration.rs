// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/api/test_route_registration.rs

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use fabstir_breed_assistant::{api::HealthResponse, create_app, AppState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use super::fakes::{chain_with, json_body, FakeDetector, RecordingChat};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_reports_empty_state() {
    let app = create_app(Arc::new(AppState::new_for_test()));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.detector_loaded);
    assert!(!health.chat_ready);
    assert_eq!(health.indexed_chunks, 0);
}

#[tokio::test]
async fn test_health_reports_loaded_components() {
    let state = AppState::new_for_test();
    *state.detector.write().await = Some(Arc::new(FakeDetector));
    *state.chain.write().await = Some(Arc::new(
        chain_with(Arc::new(RecordingChat::answering("ok"))).await,
    ));
    let app = create_app(Arc::new(state));

    let response = app.oneshot(get("/health")).await.unwrap();
    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();

    assert!(health.detector_loaded);
    assert!(health.chat_ready);
    assert_eq!(health.indexed_chunks, 2);
}

#[tokio::test]
async fn test_index_serves_template() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("index.html");
    std::fs::write(&template, "<html><body>Breed assistant</body></html>").unwrap();

    let state = AppState {
        index_template: template,
        ..AppState::new_for_test()
    };
    let app = create_app(Arc::new(state));

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(response).await.contains("Breed assistant"));
}

#[tokio::test]
async fn test_index_missing_template_is_internal_error() {
    let dir = TempDir::new().unwrap();
    let state = AppState {
        index_template: dir.path().join("missing.html"),
        ..AppState::new_for_test()
    };
    let app = create_app(Arc::new(state));

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Error loading template"));
}

#[tokio::test]
async fn test_static_files_are_served() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("js")).unwrap();
    std::fs::write(dir.path().join("js/script.js"), "console.log('moo');").unwrap();

    let state = AppState {
        static_dir: dir.path().to_path_buf(),
        ..AppState::new_for_test()
    };
    let app = create_app(Arc::new(state));

    let response = app.clone().oneshot(get("/static/js/script.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "console.log('moo');");

    let missing = app.oneshot(get("/static/js/absent.js")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let app = create_app(Arc::new(AppState::new_for_test()));

    let response = app.clone().oneshot(get("/detect")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app.oneshot(get("/chat")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_app(Arc::new(AppState::new_for_test()));
    let response = app.oneshot(get("/predict")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let app = create_app(Arc::new(AppState::new_for_test()));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/chat")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
