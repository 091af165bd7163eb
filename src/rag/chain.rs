// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieve-then-answer chain

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use super::document::Document;
use super::prompt::{stuff_documents, PromptTemplate};
use super::vector_store::VectorStore;
use crate::embeddings::TextEmbedder;
use crate::llm::{ChatMessage, ChatModel};

/// Number of documents retrieved per question
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    pub input: String,
    pub context: Vec<Document>,
    pub answer: String,
}

/// Embeds the question, retrieves the nearest chunks, stuffs them into the
/// prompt and asks the chat model
#[derive(Clone)]
pub struct RetrievalChain {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<VectorStore>,
    llm: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl RetrievalChain {
    pub fn new(embedder: Arc<dyn TextEmbedder>, store: Arc<VectorStore>, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            embedder,
            store,
            llm,
            prompt: PromptTemplate::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Number of indexed chunks
    pub fn indexed_chunks(&self) -> usize {
        self.store.len()
    }

    pub async fn invoke(&self, input: &str) -> Result<ChainOutput> {
        let query = self
            .embedder
            .embed_query(input)
            .await
            .context("Failed to embed question")?;

        let context: Vec<Document> = self
            .store
            .similarity_search_by_vector(&query, self.top_k)?
            .into_iter()
            .map(|(doc, _distance)| doc)
            .collect();

        debug!("Retrieved {} chunks for question", context.len());

        let prompt = self.prompt.format(&stuff_documents(&context), input);
        let completion = self.llm.complete(&[ChatMessage::user(prompt)]).await?;

        Ok(ChainOutput {
            input: input.to_string(),
            context,
            answer: completion.content,
        })
    }
}
