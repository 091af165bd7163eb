// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fetch missing embedding model files from the Hugging Face Hub

use anyhow::{Context, Result};
use hf_hub::api::tokio::Api;
use std::path::{Path, PathBuf};
use tracing::info;

/// File names inside a sentence-transformers repository
pub const HUB_MODEL_FILE: &str = "onnx/model.onnx";
pub const HUB_TOKENIZER_FILE: &str = "tokenizer.json";

/// Return usable paths for the model and tokenizer
///
/// Local files are used when present. Anything missing is downloaded from
/// `repo` into the hf-hub cache.
pub async fn resolve_model_files(
    model_path: &Path,
    tokenizer_path: &Path,
    repo: &str,
) -> Result<(PathBuf, PathBuf)> {
    if model_path.exists() && tokenizer_path.exists() {
        return Ok((model_path.to_path_buf(), tokenizer_path.to_path_buf()));
    }

    info!("Embedding model files missing locally, fetching {} from Hugging Face Hub", repo);
    let api = Api::new().context("Failed to initialise Hugging Face Hub client")?;
    let hub_repo = api.model(repo.to_string());

    let model = if model_path.exists() {
        model_path.to_path_buf()
    } else {
        hub_repo
            .get(HUB_MODEL_FILE)
            .await
            .with_context(|| format!("Failed to download {} from {}", HUB_MODEL_FILE, repo))?
    };

    let tokenizer = if tokenizer_path.exists() {
        tokenizer_path.to_path_buf()
    } else {
        hub_repo
            .get(HUB_TOKENIZER_FILE)
            .await
            .with_context(|| format!("Failed to download {} from {}", HUB_TOKENIZER_FILE, repo))?
    };

    info!("Using embedding model {} and tokenizer {}", model.display(), tokenizer.display());
    Ok((model, tokenizer))
}
