// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Knowledge-base chat endpoint module
//!
//! Provides POST /chat for questions answered from the reference PDF.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::chat_handler;
pub use request::{ChatRequest, MAX_MESSAGE_CHARS};
pub use response::ChatResponse;
