// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection request parsing and validation

use axum_extra::extract::Multipart;

use crate::api::errors::ApiError;
use crate::vision::DetectionParams;

/// Parsed `multipart/form-data` body of POST /detect
#[derive(Debug, Clone, PartialEq)]
pub struct DetectRequest {
    /// Raw image file bytes
    pub image: Vec<u8>,
    pub conf: f32,
    pub iou: f32,
}

impl DetectRequest {
    /// Read the `image`, `conf` and `iou` fields; unknown fields are ignored
    pub async fn from_multipart(
        mut multipart: Multipart,
        defaults: &DetectionParams,
    ) -> Result<Self, ApiError> {
        let mut image = None;
        let mut conf = defaults.conf_threshold;
        let mut iou = defaults.iou_threshold;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::InvalidRequest(format!("Failed to read image: {}", e))
                    })?;
                    image = Some(bytes.to_vec());
                }
                "conf" => conf = parse_threshold("conf", field.text().await)?,
                "iou" => iou = parse_threshold("iou", field.text().await)?,
                _ => {}
            }
        }

        let request = Self {
            image: image.ok_or_else(|| ApiError::validation("image", "image is required"))?,
            conf,
            iou,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.image.is_empty() {
            return Err(ApiError::validation("image", "image is empty"));
        }
        for (field, value) in [("conf", self.conf), ("iou", self.iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ApiError::validation(
                    field,
                    format!("must be between 0 and 1, got {}", value),
                ));
            }
        }
        Ok(())
    }

    pub fn params(&self, defaults: &DetectionParams) -> DetectionParams {
        DetectionParams {
            conf_threshold: self.conf,
            iou_threshold: self.iou,
            max_detections: defaults.max_detections,
        }
    }
}

fn parse_threshold<E: std::fmt::Display>(
    field: &str,
    text: Result<String, E>,
) -> Result<f32, ApiError> {
    let text = text.map_err(|e| ApiError::InvalidRequest(format!("Failed to read {}: {}", field, e)))?;
    text.trim()
        .parse::<f32>()
        .map_err(|_| ApiError::validation(field, format!("'{}' is not a number", text.trim())))
}
