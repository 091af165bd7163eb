// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Exact in-memory vector index
//!
//! Brute-force squared-L2 search over every stored vector. Lower distance is
//! more similar; ties keep insertion order.

use anyhow::{anyhow, Result};

use super::document::Document;

#[derive(Debug, Clone)]
pub struct VectorStore {
    dimension: usize,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
}

impl VectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            documents: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Index `documents` with their precomputed `embeddings`
    ///
    /// Nothing is added unless every vector is valid.
    pub fn add(&mut self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if documents.len() != embeddings.len() {
            return Err(anyhow!(
                "Got {} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            ));
        }

        for (i, vector) in embeddings.iter().enumerate() {
            self.validate(vector)
                .map_err(|e| anyhow!("Embedding {}: {}", i, e))?;
        }

        self.documents.extend(documents);
        self.vectors.extend(embeddings);
        Ok(())
    }

    /// Up to `k` nearest documents with their squared-L2 distance, nearest first
    pub fn similarity_search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<(Document, f32)>> {
        self.validate(query).map_err(|e| anyhow!("Query vector: {}", e))?;

        if k == 0 || self.is_empty() {
            return Ok(vec![]);
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        // Stable: equal distances stay in insertion order
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| (self.documents[i].clone(), distance))
            .collect())
    }

    fn validate(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(anyhow!(
                "Invalid vector dimensions: expected {}, got {}",
                self.dimension,
                vector.len()
            ));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(anyhow!("Invalid vector values: contains NaN or Infinity"));
        }
        Ok(())
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
