// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based image analysis
//!
//! This module provides:
//! - Image decoding and PNG data-URL encoding
//! - Object detection with a YOLO-family ONNX model
//!
//! Everything runs on CPU.

pub mod detection;
pub mod image_utils;

pub use detection::{
    annotate, BoundingBox, ClassNames, Detection, DetectionParams, ObjectDetector,
    YoloDetectionModel,
};
pub use image_utils::{
    decode_image_bytes, detect_format, encode_png_data_url, ImageError, ImageInfo,
    DEFAULT_MAX_IMAGE_BYTES,
};
