// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Longest accepted question, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::validation("message", "message must not be empty"));
        }

        let chars = self.message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ApiError::validation(
                "message",
                format!(
                    "message is {} characters, maximum is {}",
                    chars, MAX_MESSAGE_CHARS
                ),
            ));
        }

        Ok(())
    }
}
