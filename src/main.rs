// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use fabstir_breed_assistant::{
    api::{start_server, AppState},
    config::AppConfig,
    embeddings::{resolve_model_files, OnnxEmbeddingModel, TextEmbedder},
    llm::{ChatModel, GroqClient},
    rag::{build_vector_store, RetrievalChain},
    vision::{ObjectDetector, YoloDetectionModel},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Reads .env first so RUST_LOG can come from there
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚀 Starting breed assistant v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::from_config(&config));

    // Each component degrades independently; its endpoint answers 503 when missing
    match load_detector(&config).await {
        Ok(detector) => {
            info!("✅ Object detection ready ({})", detector.name());
            *state.detector.write().await = Some(detector);
        }
        Err(e) => warn!("⚠️  Object detection disabled: {:#}", e),
    }

    match build_chain(&config).await {
        Ok(chain) => *state.chain.write().await = Some(Arc::new(chain)),
        Err(e) => warn!("⚠️  Chat disabled: {:#}", e),
    }

    start_server(state, &config.server.bind_addr).await
}

async fn load_detector(config: &AppConfig) -> Result<Arc<dyn ObjectDetector>> {
    let detection = &config.detection;
    let model = YoloDetectionModel::new(
        &detection.model_path,
        detection.labels_path.as_deref(),
        detection.input_size,
    )
    .await?;
    Ok(Arc::new(model))
}

async fn build_chain(config: &AppConfig) -> Result<RetrievalChain> {
    let llm: Arc<dyn ChatModel> = Arc::new(GroqClient::from_config(&config.llm)?);

    let embedding = &config.embedding;
    let (model_path, tokenizer_path) = resolve_model_files(
        &embedding.model_path,
        &embedding.tokenizer_path,
        &embedding.model_repo,
    )
    .await?;
    let embedder: Arc<dyn TextEmbedder> =
        Arc::new(OnnxEmbeddingModel::new("all-MiniLM-L6-v2", model_path, tokenizer_path).await?);

    let store = build_vector_store(&config.knowledge, embedding.batch_size, embedder.as_ref()).await?;

    info!("✅ Chat ready ({} chunks, model {})", store.len(), llm.model_name());
    Ok(RetrievalChain::new(embedder, Arc::new(store), llm).with_top_k(config.knowledge.top_k))
}
