// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding and non-maximum suppression for YOLO-family outputs
//!
//! The detector emits one row per anchor: `cx, cy, w, h` followed by one score
//! per class, in model input coordinates. Exports differ in whether anchors are
//! the last axis (`[1, 4+nc, N]`, the Ultralytics default) or the middle axis
//! (`[1, N, 4+nc]`); both are accepted.

use anyhow::{bail, Result};
use ndarray::ArrayViewD;

use super::preprocessing::Letterbox;

/// Candidates kept before NMS, after sorting by confidence
pub const MAX_NMS_CANDIDATES: usize = 30_000;

/// Axis-aligned box in `x1, y1, x2, y2` form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box (0.0 when either is empty)
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }

    pub fn clip(&self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// A detection before class names are attached
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Thresholds applied during post-processing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

/// Decode the raw output tensor into candidates scoring above `conf_threshold`
pub fn decode_predictions(output: &ArrayViewD<f32>, conf_threshold: f32) -> Result<Vec<RawDetection>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 {
        bail!(
            "Unexpected detection output shape: {:?}, expected [1, 4+nc, N] or [1, N, 4+nc]",
            shape
        );
    }

    // The attribute axis (4 + classes) is always the smaller one
    let anchors_last = shape[1] <= shape[2];
    let (channels, anchors) = if anchors_last {
        (shape[1], shape[2])
    } else {
        (shape[2], shape[1])
    };

    if channels <= 4 {
        bail!(
            "Detection output has {} attributes per anchor, expected at least 5",
            channels
        );
    }

    let value = |attr: usize, anchor: usize| -> f32 {
        if anchors_last {
            output[[0, attr, anchor]]
        } else {
            output[[0, anchor, attr]]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, confidence) = (4..channels)
            .map(|attr| (attr - 4, value(attr, anchor)))
            .fold((0, f32::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            });

        if confidence <= conf_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(
            value(0, anchor),
            value(1, anchor),
            value(2, anchor),
            value(3, anchor),
        );

        candidates.push(RawDetection {
            class_id,
            confidence,
            bbox,
        });
    }

    Ok(candidates)
}

/// Class-aware NMS: boxes of different classes never suppress each other
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    // Stable sort keeps anchor order among equal scores
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(MAX_NMS_CANDIDATES);

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

/// Map boxes from letterboxed input space back to the original image
pub fn rescale_to_original(detections: Vec<RawDetection>, letterbox: &Letterbox) -> Vec<RawDetection> {
    let width = letterbox.orig_width as f32;
    let height = letterbox.orig_height as f32;

    detections
        .into_iter()
        .map(|mut det| {
            let (x1, y1) = letterbox.to_original(det.bbox.x1, det.bbox.y1);
            let (x2, y2) = letterbox.to_original(det.bbox.x2, det.bbox.y2);
            det.bbox = BoundingBox { x1, y1, x2, y2 }.clip(width, height);
            det
        })
        .collect()
}

/// Full post-processing: decode, NMS, rescale
pub fn postprocess(
    output: &ArrayViewD<f32>,
    params: &DetectionParams,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>> {
    let candidates = decode_predictions(output, params.conf_threshold)?;
    let kept = non_max_suppression(candidates, params.iou_threshold, params.max_detections);
    Ok(rescale_to_original(kept, letterbox))
}
