// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_retrieval_chain.rs

use anyhow::Result;
use async_trait::async_trait;
use fabstir_breed_assistant::{
    embeddings::TextEmbedder,
    llm::{ChatCompletion, ChatMessage, ChatModel, LlmError},
    rag::{index_documents, CharacterTextSplitter, Document, PromptTemplate, RetrievalChain},
};
use std::sync::{Arc, Mutex};

const BREEDS: [&str; 4] = ["holstein", "jersey", "gir", "sahiwal"];

/// One dimension per known breed name
struct BreedEmbedder;

#[async_trait]
impl TextEmbedder for BreedEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| breed_vector(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(breed_vector(text))
    }

    fn dimension(&self) -> usize {
        BREEDS.len()
    }
}

fn breed_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    BREEDS
        .iter()
        .map(|b| if lower.contains(b) { 1.0 } else { 0.0 })
        .collect()
}

#[derive(Default)]
struct EchoPromptLlm {
    seen: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl ChatModel for EchoPromptLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, LlmError> {
        self.seen.lock().unwrap().extend_from_slice(messages);
        Ok(ChatCompletion {
            content: format!("answered {} message(s)", messages.len()),
            model: "echo".to_string(),
            total_tokens: Some(10),
        })
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn pages() -> Vec<Document> {
    vec![
        Document::new("Holstein cattle are the highest milk producers.\n\nHolstein coats are black and white.")
            .with_metadata("page", 0),
        Document::new("Jersey cattle produce rich milk.\n\nGir cattle come from Gujarat.")
            .with_metadata("page", 1),
        Document::new("Sahiwal cattle tolerate heat.").with_metadata("page", 2),
    ]
}

async fn chain(llm: Arc<EchoPromptLlm>, top_k: usize) -> RetrievalChain {
    let splitter = CharacterTextSplitter::new("\n\n", 60, 0).unwrap();
    let store = index_documents(&pages(), &splitter, 2, &BreedEmbedder)
        .await
        .unwrap();
    RetrievalChain::new(Arc::new(BreedEmbedder), Arc::new(store), llm).with_top_k(top_k)
}

#[tokio::test]
async fn test_indexes_every_chunk() {
    let chain = chain(Arc::new(EchoPromptLlm::default()), 4).await;
    assert_eq!(chain.indexed_chunks(), 5);
}

#[tokio::test]
async fn test_retrieves_matching_breed_chunks() {
    let llm = Arc::new(EchoPromptLlm::default());
    let chain = chain(llm.clone(), 2).await;

    let output = chain.invoke("Tell me about Holstein").await.unwrap();

    assert_eq!(output.context.len(), 2);
    assert!(output
        .context
        .iter()
        .all(|doc| doc.page_content.starts_with("Holstein")));
    assert!(output.context.iter().all(|doc| doc.page() == Some(0)));
    assert_eq!(output.answer, "answered 1 message(s)");

    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].role, "user");
    assert!(seen[0].content.starts_with("Answer the questions based on the provided context only."));
    assert!(seen[0].content.contains("black and white"));
    assert!(!seen[0].content.contains("Gujarat"));
}

#[tokio::test]
async fn test_custom_prompt_template() {
    let llm = Arc::new(EchoPromptLlm::default());
    let chain = chain(llm.clone(), 1)
        .await
        .with_prompt(PromptTemplate::new("Q: {input}\nCTX: {context}"));

    chain.invoke("Where are Gir from?").await.unwrap();

    let seen = llm.seen.lock().unwrap();
    assert_eq!(
        seen[0].content,
        "Q: Where are Gir from?\nCTX: Gir cattle come from Gujarat."
    );
}

#[tokio::test]
async fn test_question_braces_are_not_expanded() {
    let llm = Arc::new(EchoPromptLlm::default());
    let chain = chain(llm.clone(), 1).await;

    chain.invoke("What does {context} mean for Sahiwal?").await.unwrap();

    let seen = llm.seen.lock().unwrap();
    assert!(seen[0]
        .content
        .ends_with("Questions:What does {context} mean for Sahiwal?"));
}
