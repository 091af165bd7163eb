// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF loading: one document per page

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use super::document::Document;

/// Load `path` into one `Document` per page that has text
///
/// Metadata carries `source` (the path as given) and `page` (0-based).
pub async fn load_pdf<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref().to_path_buf();
    if !path.exists() {
        anyhow::bail!("PDF not found: {}", path.display());
    }

    let documents = tokio::task::spawn_blocking(move || load_pdf_blocking(&path))
        .await
        .context("PDF extraction task panicked")??;

    Ok(documents)
}

fn load_pdf_blocking(path: &Path) -> Result<Vec<Document>> {
    let source = path.to_string_lossy().into_owned();

    let documents = match extract_pages(path, &source) {
        Ok(docs) => docs,
        Err(e) => {
            warn!("Per-page extraction failed for {}: {:#}", source, e);
            Vec::new()
        }
    };

    if !documents.is_empty() {
        return Ok(documents);
    }

    debug!("Falling back to whole-document extraction for {}", source);
    let text = pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from {}", source))?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Document::new(text)
        .with_metadata("source", source)
        .with_metadata("page", 0)])
}

fn extract_pages(path: &Path, source: &str) -> Result<Vec<Document>> {
    let pdf = lopdf::Document::load(path)
        .with_context(|| format!("Failed to parse PDF {}", source))?;

    let mut documents = Vec::new();
    // get_pages is keyed by 1-based page number, in page order
    for (index, page_number) in pdf.get_pages().keys().enumerate() {
        let text = match pdf.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping page {} of {}: {}", page_number, source, e);
                continue;
            }
        };

        if text.trim().is_empty() {
            continue;
        }

        documents.push(
            Document::new(text)
                .with_metadata("source", source)
                .with_metadata("page", index),
        );
    }

    Ok(documents)
}
