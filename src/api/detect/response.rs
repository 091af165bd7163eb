// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::{Deserialize, Serialize};

use crate::vision::Detection;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedObject {
    /// Class name
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in original image pixels
    pub bbox: [f32; 4],
}

impl From<&Detection> for DetectedObject {
    fn from(detection: &Detection) -> Self {
        Self {
            class_name: detection.class_name.clone(),
            confidence: detection.confidence,
            bbox: detection.bbox.to_array(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    /// Annotated image as a PNG data URL
    pub image: String,
    pub objects: Vec<DetectedObject>,
}
