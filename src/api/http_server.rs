// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: router, shared state and the page/health handlers

use axum::{
    extract::{DefaultBodyLimit, State},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::chat::chat_handler;
use super::detect::detect_handler;
use super::errors::ApiError;
use crate::config::AppConfig;
use crate::rag::RetrievalChain;
use crate::vision::{DetectionParams, ObjectDetector, DEFAULT_MAX_IMAGE_BYTES};

/// State shared by all handlers
///
/// The detector and chain are optional: a component that failed to load at
/// startup leaves its slot empty and its endpoint answers 503.
pub struct AppState {
    pub detector: Arc<RwLock<Option<Arc<dyn ObjectDetector>>>>,
    pub chain: Arc<RwLock<Option<Arc<RetrievalChain>>>>,
    pub detection_defaults: DetectionParams,
    pub index_template: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            detector: Arc::new(RwLock::new(None)),
            chain: Arc::new(RwLock::new(None)),
            detection_defaults: DetectionParams {
                conf_threshold: config.detection.conf_threshold,
                iou_threshold: config.detection.iou_threshold,
                max_detections: config.detection.max_detections,
            },
            index_template: config.server.index_template.clone(),
            static_dir: config.server.static_dir.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }

    /// State with nothing loaded and default settings
    pub fn new_for_test() -> Self {
        Self {
            detector: Arc::new(RwLock::new(None)),
            chain: Arc::new(RwLock::new(None)),
            detection_defaults: DetectionParams::default(),
            index_template: PathBuf::from("./templates/index.html"),
            static_dir: PathBuf::from("./static"),
            max_upload_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub detector_loaded: bool,
    pub chat_ready: bool,
    pub indexed_chunks: usize,
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/detect", post(detect_handler))
        .route("/chat", post(chat_handler))
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: Arc<AppState>, bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr.parse()?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET / - the single-page UI
async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    tokio::fs::read_to_string(&state.index_template)
        .await
        .map(Html)
        .map_err(|e| {
            error!(
                "Error loading template {}: {}",
                state.index_template.display(),
                e
            );
            ApiError::InternalError(format!("Error loading template: {}", e))
        })
}

/// GET /health
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let detector_loaded = state.detector.read().await.is_some();
    let chain = state.chain.read().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        detector_loaded,
        chat_ready: chain.is_some(),
        indexed_chunks: chain.as_ref().map(|c| c.indexed_chunks()).unwrap_or(0),
    })
}
