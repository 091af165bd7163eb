// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted chat completion models

pub mod groq;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use groq::GroqClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response contained no choices")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// First choice of a completion plus token accounting
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub total_tokens: Option<u32>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, LlmError>;

    fn model_name(&self) -> &str;
}
