// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection
//!
//! Letterbox preprocessing, ONNX inference and YOLO post-processing, plus
//! drawing the results back onto the uploaded image.

pub mod annotate;
pub mod labels;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;

use anyhow::Result;
use image::DynamicImage;

pub use annotate::{annotate, box_color, line_width};
pub use labels::ClassNames;
pub use model::YoloDetectionModel;
pub use postprocessing::{BoundingBox, DetectionParams, RawDetection};
pub use preprocessing::{Letterbox, DETECTION_INPUT_SIZE};

/// A detected object in original image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Anything that can find objects in an image
///
/// Implementations are blocking and are called from `spawn_blocking`.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage, params: &DetectionParams) -> Result<Vec<Detection>>;

    fn name(&self) -> &str;
}
