// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO detector backed by ONNX Runtime

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::labels::ClassNames;
use super::postprocessing::{postprocess, DetectionParams};
use super::preprocessing::preprocess_for_detection;
use super::{Detection, ObjectDetector};

/// Ultralytics YOLOv8/v11 model exported to ONNX
///
/// Runs on CPU. The session is shared behind a mutex so clones can be handed
/// to blocking tasks.
#[derive(Clone)]
pub struct YoloDetectionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
    class_names: ClassNames,
    name: String,
}

impl std::fmt::Debug for YoloDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetectionModel")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("classes", &self.class_names.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetectionModel {
    /// Load a detector from `model_path`
    ///
    /// Class names come from `labels_path` when given, otherwise from the
    /// `names` metadata entry written by the Ultralytics exporter.
    pub async fn new<P: AsRef<Path>>(
        model_path: P,
        labels_path: Option<&Path>,
        input_size: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("Failed to load detection model from {}", model_path.display())
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input {}: {:?}", input_name, input.input_type);
        }

        let class_names = match labels_path {
            Some(path) => ClassNames::from_file(path).await?,
            None => Self::names_from_metadata(&session),
        };

        let name = model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolo".to_string());

        info!(
            "✅ Detection model {} loaded ({} classes, input {}x{})",
            name,
            class_names.len(),
            input_size,
            input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size,
            class_names,
            name,
        })
    }

    fn names_from_metadata(session: &Session) -> ClassNames {
        let raw = session
            .metadata()
            .ok()
            .and_then(|metadata| metadata.custom("names").ok().flatten());

        match raw {
            Some(value) => match ClassNames::parse_metadata(&value) {
                Ok(names) => names,
                Err(e) => {
                    warn!("Ignoring unreadable class names in model metadata: {}", e);
                    ClassNames::default()
                }
            },
            None => {
                warn!("Detection model has no class names; using numeric labels");
                ClassNames::default()
            }
        }
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }
}

impl ObjectDetector for YoloDetectionModel {
    fn detect(&self, image: &DynamicImage, params: &DetectionParams) -> Result<Vec<Detection>> {
        let (tensor, letterbox) = preprocess_for_detection(image, self.input_size);

        let input_value = Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract detection output")?;

        debug!("Detection output shape: {:?}", output.shape());

        let detections = postprocess(&output.view(), params, &letterbox)?
            .into_iter()
            .map(|raw| Detection {
                class_name: self.class_names.name(raw.class_id),
                class_id: raw.class_id,
                confidence: raw.confidence,
                bbox: raw.bbox,
            })
            .collect::<Vec<_>>();

        debug!("Detected {} objects", detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
