// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod llm;
pub mod rag;
pub mod vision;

pub use api::{create_app, start_server, ApiError, AppState};
pub use config::AppConfig;
pub use embeddings::{OnnxEmbeddingModel, TextEmbedder};
pub use llm::{ChatModel, GroqClient, LlmError};
pub use rag::{ChainOutput, RetrievalChain, VectorStore};
pub use vision::{Detection, DetectionParams, ObjectDetector, YoloDetectionModel};
