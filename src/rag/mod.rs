// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! RAG (Retrieval-Augmented Generation) over the breed reference PDF
//!
//! The PDF is loaded, split and embedded once at startup. Questions are
//! answered by retrieving the nearest chunks and asking the chat model.

pub mod chain;
pub mod document;
pub mod knowledge_base;
pub mod pdf;
pub mod prompt;
pub mod splitter;
pub mod vector_store;

pub use chain::{ChainOutput, RetrievalChain};
pub use document::Document;
pub use knowledge_base::{build_vector_store, index_documents};
pub use pdf::load_pdf;
pub use prompt::{stuff_documents, PromptTemplate, DEFAULT_QA_TEMPLATE};
pub use splitter::CharacterTextSplitter;
pub use vector_store::VectorStore;
