// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup indexing of the reference PDF

use anyhow::{bail, Context, Result};
use std::time::Instant;
use tracing::{debug, info};

use super::document::Document;
use super::pdf::load_pdf;
use super::splitter::CharacterTextSplitter;
use super::vector_store::VectorStore;
use crate::config::KnowledgeArgs;
use crate::embeddings::TextEmbedder;

/// Load, split, embed and index the configured PDF
pub async fn build_vector_store(
    config: &KnowledgeArgs,
    batch_size: usize,
    embedder: &dyn TextEmbedder,
) -> Result<VectorStore> {
    let start = Instant::now();
    let pages = load_pdf(&config.pdf_path).await?;
    info!("Loaded {} pages from {}", pages.len(), config.pdf_path.display());

    let splitter = CharacterTextSplitter::new(
        config.chunk_separator.clone(),
        config.chunk_size,
        config.chunk_overlap,
    )?;

    let store = index_documents(&pages, &splitter, batch_size, embedder).await?;

    info!(
        "✅ Knowledge base ready: {} chunks indexed in {}ms",
        store.len(),
        start.elapsed().as_millis()
    );
    Ok(store)
}

/// Split `documents` and index each chunk, embedding `batch_size` chunks at a time
pub async fn index_documents(
    documents: &[Document],
    splitter: &CharacterTextSplitter,
    batch_size: usize,
    embedder: &dyn TextEmbedder,
) -> Result<VectorStore> {
    let chunks = splitter.split_documents(documents);
    if chunks.is_empty() {
        bail!("No text chunks to index");
    }
    info!(
        "Split into {} chunks (size {}, overlap {})",
        chunks.len(),
        splitter.chunk_size(),
        splitter.chunk_overlap()
    );

    let mut store = VectorStore::new(embedder.dimension());
    let batch_size = batch_size.max(1);
    let total_batches = chunks.len().div_ceil(batch_size);

    for (batch_index, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|doc| doc.page_content.clone()).collect();
        let embeddings = embedder
            .embed_documents(&texts)
            .await
            .with_context(|| format!("Failed to embed batch {}/{}", batch_index + 1, total_batches))?;

        store.add(batch.to_vec(), embeddings)?;
        debug!("Embedded batch {}/{}", batch_index + 1, total_batches);
    }

    Ok(store)
}
