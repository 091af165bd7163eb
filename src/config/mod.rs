// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Every setting can be passed as a flag or through the environment (a `.env`
//! file is loaded before parsing).

use anyhow::{bail, Result};
use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::vision::DEFAULT_MAX_IMAGE_BYTES;

/// Fabstir breed assistant node
#[derive(Parser, Debug, Clone)]
#[command(name = "fabstir-breed-assistant")]
#[command(about = "Object detection and breed Q&A over a reference PDF", long_about = None)]
pub struct AppConfig {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    #[command(flatten)]
    pub knowledge: KnowledgeArgs,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// HTTP server settings
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: String,

    /// Directory served under /static
    #[arg(long, env = "STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// HTML page served at /
    #[arg(long, env = "INDEX_TEMPLATE", default_value = "./templates/index.html")]
    pub index_template: PathBuf,

    /// Maximum accepted request body (image uploads)
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_IMAGE_BYTES)]
    pub max_upload_bytes: usize,
}

/// Object detection settings
#[derive(Args, Debug, Clone)]
pub struct DetectionArgs {
    /// YOLO-family detector exported to ONNX
    #[arg(long, env = "DETECTION_MODEL_PATH", default_value = "./models/version4.onnx")]
    pub model_path: PathBuf,

    /// Optional class names file (one per line), overrides model metadata
    #[arg(long, env = "DETECTION_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Square model input size in pixels
    #[arg(long, env = "DETECTION_INPUT_SIZE", default_value_t = 640)]
    pub input_size: u32,

    /// Default confidence threshold
    #[arg(long, env = "DETECTION_CONF", default_value_t = 0.25)]
    pub conf_threshold: f32,

    /// Default IoU threshold for non-maximum suppression
    #[arg(long, env = "DETECTION_IOU", default_value_t = 0.45)]
    pub iou_threshold: f32,

    /// Maximum detections returned per image
    #[arg(long, env = "DETECTION_MAX_DETECTIONS", default_value_t = 300)]
    pub max_detections: usize,
}

/// Sentence embedding settings
#[derive(Args, Debug, Clone)]
pub struct EmbeddingArgs {
    #[arg(
        id = "embedding_model_path",
        long = "embedding-model-path",
        env = "EMBEDDING_MODEL_PATH",
        default_value = "./models/all-MiniLM-L6-v2-onnx/model.onnx"
    )]
    pub model_path: PathBuf,

    #[arg(
        long = "embedding-tokenizer-path",
        env = "EMBEDDING_TOKENIZER_PATH",
        default_value = "./models/all-MiniLM-L6-v2-onnx/tokenizer.json"
    )]
    pub tokenizer_path: PathBuf,

    /// Hugging Face repository used when the local files are missing
    #[arg(
        long = "embedding-model-repo",
        env = "EMBEDDING_MODEL_REPO",
        default_value = "sentence-transformers/all-MiniLM-L6-v2"
    )]
    pub model_repo: String,

    #[arg(long = "embedding-batch-size", env = "EMBEDDING_BATCH_SIZE", default_value_t = 32)]
    pub batch_size: usize,
}

/// Knowledge base (PDF) settings
#[derive(Args, Debug, Clone)]
pub struct KnowledgeArgs {
    #[arg(long, env = "KNOWLEDGE_PDF_PATH", default_value = "app/breed2.pdf")]
    pub pdf_path: PathBuf,

    /// Maximum chunk length in characters
    #[arg(long, env = "CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = 0)]
    pub chunk_overlap: usize,

    #[arg(long, env = "CHUNK_SEPARATOR", default_value = "\n\n")]
    pub chunk_separator: String,

    /// Number of chunks retrieved per question
    #[arg(long, env = "RETRIEVAL_TOP_K", default_value_t = 4)]
    pub top_k: usize,
}

/// Hosted LLM settings (Groq, OpenAI-compatible)
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    #[arg(long, env = "GROQ_BASE_URL", default_value = "https://api.groq.com/openai/v1")]
    pub groq_base_url: String,

    #[arg(long, env = "GROQ_MODEL", default_value = "llama3-8b-8192")]
    pub groq_model: String,

    #[arg(long, env = "LLM_TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl LlmArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load `.env` (if present) and parse flags/environment
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let detection = &self.detection;
        if !(0.0..=1.0).contains(&detection.conf_threshold) {
            bail!(
                "DETECTION_CONF must be within [0, 1], got {}",
                detection.conf_threshold
            );
        }
        if !(0.0..=1.0).contains(&detection.iou_threshold) {
            bail!(
                "DETECTION_IOU must be within [0, 1], got {}",
                detection.iou_threshold
            );
        }
        if detection.input_size == 0 || detection.input_size % 32 != 0 {
            bail!(
                "DETECTION_INPUT_SIZE must be a positive multiple of 32, got {}",
                detection.input_size
            );
        }
        if detection.max_detections == 0 {
            bail!("DETECTION_MAX_DETECTIONS must be greater than 0");
        }

        let knowledge = &self.knowledge;
        if knowledge.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than 0");
        }
        if knowledge.chunk_overlap > knowledge.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) is larger than CHUNK_SIZE ({})",
                knowledge.chunk_overlap,
                knowledge.chunk_size
            );
        }
        if knowledge.top_k == 0 {
            bail!("RETRIEVAL_TOP_K must be greater than 0");
        }
        if self.embedding.batch_size == 0 {
            bail!("EMBEDDING_BATCH_SIZE must be greater than 0");
        }

        Ok(())
    }
}
