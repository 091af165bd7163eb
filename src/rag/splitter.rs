// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Separator-based text chunking
//!
//! Text is cut on a literal separator and the pieces are greedily re-joined
//! into chunks of at most `chunk_size` characters. Lengths are counted in
//! `char`s, not bytes.

use anyhow::{bail, Result};
use std::collections::VecDeque;
use tracing::warn;

use super::document::Document;

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterTextSplitter {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for CharacterTextSplitter {
    fn default() -> Self {
        Self {
            separator: "\n\n".to_string(),
            chunk_size: 1000,
            chunk_overlap: 0,
        }
    }
}

impl CharacterTextSplitter {
    pub fn new(separator: impl Into<String>, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk_size must be greater than 0");
        }
        if chunk_overlap > chunk_size {
            bail!(
                "Got a larger chunk overlap ({}) than chunk size ({}), should be smaller",
                chunk_overlap,
                chunk_size
            );
        }
        Ok(Self {
            separator: separator.into(),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = if self.separator.is_empty() {
            // Empty separator splits into characters
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(self.separator.as_str())
                .filter(|piece| !piece.is_empty())
                .collect()
        };

        self.merge_pieces(&pieces)
    }

    /// Split each document, copying its metadata onto every chunk
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .map(move |chunk| Document {
                        page_content: chunk,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let separator_len = self.separator.chars().count();
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = piece.chars().count();
            let joiner = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner(&current) > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(chunk) = self.join(&current) {
                        chunks.push(chunk);
                    }

                    // Drop leading pieces until the remainder fits the overlap budget
                    while total > self.chunk_overlap
                        || (total + len + joiner(&current) > self.chunk_size && total > 0)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        let first_len = first.chars().count();
                        let trailing = if current.is_empty() { 0 } else { separator_len };
                        total = total.saturating_sub(first_len + trailing);
                    }
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(chunk) = self.join(&current) {
            chunks.push(chunk);
        }

        // A single oversized piece ends up alone; report it once it is emitted
        if let Some(last) = chunks.last() {
            let last_len = last.chars().count();
            if last_len > self.chunk_size && current.len() == 1 {
                warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    last_len, self.chunk_size
                );
            }
        }

        chunks
    }

    fn join(&self, pieces: &VecDeque<&str>) -> Option<String> {
        let joined = pieces
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(&self.separator);
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
