// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Question-answering prompt

use super::document::Document;

pub const DEFAULT_QA_TEMPLATE: &str = "Answer the questions based on the provided context only. Please provide the most accurate response based on the question <context> {context} </context> Questions:{input}";

/// Separator placed between retrieved documents
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_QA_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill `{context}` and `{input}` in a single pass, so placeholder text
    /// inside either value is left untouched
    pub fn format(&self, context: &str, input: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + input.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{input}") {
                out.push_str(input);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Concatenate page contents for the `{context}` slot
pub fn stuff_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}
