// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Groq client via its OpenAI-compatible API

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{ChatCompletion, ChatMessage, ChatModel, LlmError};
use crate::config::LlmArgs;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GroqClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Groq client configured: base_url={}, model={}", base_url, model);

        Ok(Self {
            client,
            base_url,
            api_key,
            model: model.to_string(),
            temperature,
        })
    }

    pub fn from_config(config: &LlmArgs) -> Result<Self, LlmError> {
        Self::new(
            config.groq_api_key.clone(),
            &config.groq_base_url,
            &config.groq_model,
            config.temperature,
            config.timeout(),
        )
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, LlmError> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("invalid response body: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        debug!(
            "Groq completion in {}ms ({} chars)",
            start.elapsed().as_millis(),
            content.len()
        );

        Ok(ChatCompletion {
            content,
            model: chat_response.model.unwrap_or_else(|| self.model.clone()),
            total_tokens: chat_response.usage.map(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
