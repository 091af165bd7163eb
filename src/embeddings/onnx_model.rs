// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence embedding model
//!
//! Runs all-MiniLM-L6-v2 through ONNX Runtime on CPU:
//! - BERT tokenization, truncated to 256 tokens and padded to the batch
//! - Mean pooling over token embeddings, weighted by the attention mask
//! - L2 normalization
//! - 384-dimensional output vectors

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayView3, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::TextEmbedder;

/// Output dimension of all-MiniLM-L6-v2
pub const EMBEDDING_DIMENSION: usize = 384;

/// Word pieces kept per input (sentence-transformers `max_seq_length`)
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// Cloning is cheap; the session and tokenizer are shared.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Load the model and tokenizer from disk
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - Model doesn't output 384 dimensions
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("Loading embedding model {} from {}", model_name, model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: EMBEDDING_DIMENSION,
        };
        // Fail at startup on an export with the wrong output width
        let sample = model.embed_blocking(&["validation test".to_string()])?;
        if sample.first().map(Vec::len) != Some(EMBEDDING_DIMENSION) {
            anyhow::bail!(
                "Model outputs unexpected dimensions (expected {})",
                EMBEDDING_DIMENSION
            );
        }

        info!("✅ Embedding model {} loaded (CPU-only)", model.model_name);
        Ok(model)
    }

    /// Synchronous batch embedding; callers on the runtime go through `TextEmbedder`
    pub fn embed_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let batch = encodings.len();
        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        let mut input_ids = Array2::<i64>::zeros((batch, seq_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, seq_len));
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                input_ids[[row, col]] = id as i64;
                attention_mask[[row, col]] = mask as i64;
            }
        }
        let token_type_ids = Array2::<i64>::zeros((batch, seq_len));

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Embedding session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids)?,
            "attention_mask" => Value::from_array(attention_mask.clone())?,
            "token_type_ids" => Value::from_array(token_type_ids)?
        ])?;

        // Index 0: output names differ between exports
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        // [batch, seq_len, hidden_dim]
        let token_embeddings = output
            .into_dimensionality::<ndarray::Ix3>()
            .map_err(|_| anyhow!("Expected token embeddings of rank 3"))?;

        let mut embeddings = mean_pool(token_embeddings, &attention_mask);
        for embedding in &mut embeddings {
            l2_normalize(embedding);
        }

        for (i, emb) in embeddings.iter().enumerate() {
            if emb.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    emb.len(),
                    self.dimension
                );
            }
        }

        debug!("Embedded {} texts (seq_len {})", batch, seq_len);
        Ok(embeddings)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl TextEmbedder for OnnxEmbeddingModel {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed_blocking(&texts))
            .await
            .context("Embedding task panicked")?
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| anyhow!("Embedding model returned no vector"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Average token embeddings per row, ignoring padded positions
pub fn mean_pool(token_embeddings: ArrayView3<f32>, attention_mask: &Array2<i64>) -> Vec<Vec<f32>> {
    token_embeddings
        .axis_iter(Axis(0))
        .zip(attention_mask.axis_iter(Axis(0)))
        .map(|(tokens, mask)| {
            let hidden_dim = tokens.shape()[1];
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut sum_mask = 0.0f32;

            for (token, &m) in tokens.axis_iter(Axis(0)).zip(mask.iter()) {
                let weight = m as f32;
                sum_mask += weight;
                for (acc, &value) in pooled.iter_mut().zip(token.iter()) {
                    *acc += value * weight;
                }
            }

            let denom = sum_mask.max(1e-9);
            pooled.iter_mut().for_each(|v| *v /= denom);
            pooled
        })
        .collect()
}

/// Scale to unit length in place; zero vectors are left alone
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}
