// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection endpoint module
//!
//! Provides POST /detect for finding objects in an uploaded image.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::detect_handler;
pub use request::DetectRequest;
pub use response::{DetectResponse, DetectedObject};
