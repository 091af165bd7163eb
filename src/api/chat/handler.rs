// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::request::ChatRequest;
use super::response::ChatResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /chat - Answer a question from the knowledge base
///
/// # Request
/// - `message`: the question (non-empty, at most 4000 characters)
///
/// # Response
/// - `response`: the model's answer
///
/// # Errors
/// - 400 Bad Request: malformed JSON or invalid message
/// - 503 Service Unavailable: knowledge base or LLM not initialised
/// - 500 Internal Server Error: retrieval or LLM call failed
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!("Chat request rejected: {}", e.body_text());
        ApiError::InvalidRequest(e.body_text())
    })?;

    if let Err(e) = request.validate() {
        warn!("Chat validation failed: {}", e);
        return Err(e);
    }

    let chain = state.chain.read().await.clone().ok_or_else(|| {
        warn!("Chat requested but the knowledge base is not ready");
        ApiError::ServiceUnavailable("Chat service not available".to_string())
    })?;

    let start = Instant::now();
    let output = chain.invoke(&request.message).await.map_err(|e| {
        error!("Error in chat: {:#}", e);
        ApiError::InternalError(e.to_string())
    })?;

    info!(
        "Chat answered in {}ms using {} chunks",
        start.elapsed().as_millis(),
        output.context.len()
    );

    Ok(Json(ChatResponse {
        response: output.answer,
    }))
}
