// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::request::DetectRequest;
use super::response::{DetectResponse, DetectedObject};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{annotate, decode_image_bytes, encode_png_data_url};

/// POST /detect - Find objects in an uploaded image
///
/// # Request (`multipart/form-data`)
/// - `image`: image file (required)
/// - `conf`: confidence threshold, defaults to the configured value
/// - `iou`: NMS IoU threshold, defaults to the configured value
///
/// # Response
/// - `image`: annotated image as a PNG data URL
/// - `objects`: `[{class, confidence, bbox}]`, boxes as `[x1, y1, x2, y2]`
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image, bad thresholds
/// - 503 Service Unavailable: detection model not loaded
/// - 500 Internal Server Error: inference or encoding failed
pub async fn detect_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let start = Instant::now();

    let detector = state.detector.read().await.clone().ok_or_else(|| {
        warn!("Detection requested but no model is loaded");
        ApiError::ServiceUnavailable("Detection model not loaded".to_string())
    })?;

    let request = DetectRequest::from_multipart(multipart, &state.detection_defaults)
        .await
        .map_err(|e| {
            warn!("Detection request rejected: {}", e);
            e
        })?;
    let params = request.params(&state.detection_defaults);

    let (image, info) = decode_image_bytes(&request.image, state.max_upload_bytes).map_err(|e| {
        warn!("Failed to decode image: {}", e);
        ApiError::InvalidRequest(format!("Invalid image: {}", e))
    })?;
    debug!(
        "Decoded image: {}x{}, {} bytes",
        info.width, info.height, info.size_bytes
    );

    let detector_name = detector.name().to_string();

    // Inference, drawing and PNG encoding are CPU-bound
    let (detections, data_url) = tokio::task::spawn_blocking(move || {
        let detections = detector.detect(&image, &params)?;
        let annotated = annotate(&image, &detections);
        let data_url = encode_png_data_url(&annotated)?;
        Ok::<_, anyhow::Error>((detections, data_url))
    })
    .await
    .map_err(|e| {
        error!("Detection task panicked: {}", e);
        ApiError::InternalError("Detection task failed".to_string())
    })?
    .map_err(|e| {
        error!("Error in object detection: {:#}", e);
        ApiError::InternalError(e.to_string())
    })?;

    info!(
        "Detection complete: {} objects from {} in {}ms",
        detections.len(),
        detector_name,
        start.elapsed().as_millis()
    );

    Ok(Json(DetectResponse {
        image: data_url,
        objects: detections.iter().map(DetectedObject::from).collect(),
    }))
}
