// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sentence embeddings for the knowledge base

pub mod hub;
pub mod onnx_model;

use anyhow::Result;
use async_trait::async_trait;

pub use hub::resolve_model_files;
pub use onnx_model::{OnnxEmbeddingModel, EMBEDDING_DIMENSION};

/// Turns text into fixed-size vectors
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// One vector per input, in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}
