// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/api/test_chat_endpoint.rs

use axum::http::StatusCode;
use fabstir_breed_assistant::{create_app, AppState};
use std::sync::Arc;
use tower::ServiceExt;

use super::fakes::{chain_with, chat_request, json_body, RecordingChat};

async fn state_with_chat(llm: Arc<RecordingChat>) -> Arc<AppState> {
    let state = AppState::new_for_test();
    *state.chain.write().await = Some(Arc::new(chain_with(llm).await));
    Arc::new(state)
}

#[tokio::test]
async fn test_chat_answers_from_retrieved_context() {
    let llm = Arc::new(RecordingChat::answering("Holsteins are black and white."));
    let app = create_app(state_with_chat(llm.clone()).await);

    let response = app
        .oneshot(chat_request(r#"{"message": "What colour is a Holstein?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({"response": "Holsteins are black and white."}));

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("black and white dairy cows"));
    assert!(!prompts[0].contains("fawn coloured"));
    assert!(prompts[0].ends_with("Questions:What colour is a Holstein?"));
}

#[tokio::test]
async fn test_chat_without_knowledge_base_is_unavailable() {
    let app = create_app(Arc::new(AppState::new_for_test()));

    let response = app
        .oneshot(chat_request(r#"{"message": "Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let llm = Arc::new(RecordingChat::answering("unused"));
    let app = create_app(state_with_chat(llm.clone()).await);

    let response = app
        .oneshot(chat_request(r#"{"message": "   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("message:"));
    assert!(llm.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_rejects_oversized_message() {
    let llm = Arc::new(RecordingChat::answering("unused"));
    let app = create_app(state_with_chat(llm).await);
    let body = serde_json::json!({ "message": "a".repeat(4001) }).to_string();

    let response = app.oneshot(chat_request(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_rejects_malformed_json() {
    let llm = Arc::new(RecordingChat::answering("unused"));
    let app = create_app(state_with_chat(llm).await);

    let response = app
        .oneshot(chat_request(r#"{"msg": "wrong field"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_llm_failure_is_internal_error() {
    let llm = Arc::new(RecordingChat::failing(503));
    let app = create_app(state_with_chat(llm).await);

    let response = app
        .oneshot(chat_request(r#"{"message": "Tell me about Jersey cattle"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("503"));
}
