use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use zenti_agent::application::KnowledgeBaseLoader;
use zenti_agent::bootstrap;
use zenti_agent::infrastructure::{AppConfig, VectorStoreBackend};

/// Loads a knowledge-base file into the configured vector store.
///
/// Usage: `load-kb [path]`, defaulting to `knowledge_base.path` from config.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    bootstrap::init_tracing("load_kb=info,zenti_agent=info");

    let config = AppConfig::load()?;
    if config.config.vector_store.backend == VectorStoreBackend::Memory {
        tracing::warn!("in-memory vector store selected; loaded items are discarded on exit");
    }

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.config.knowledge_base.path.clone());

    let rag = bootstrap::build_rag(&config.config)?;
    let loader = KnowledgeBaseLoader::new(Arc::clone(&rag));

    info!(path = %path.display(), "loading knowledge base");
    let report = loader.load_file(&path).await?;

    info!(
        site = %report.site,
        stored = report.stored,
        skipped = report.skipped.len(),
        "knowledge base loaded"
    );
    for name in &report.skipped {
        tracing::warn!(name = %name, "item not loaded");
    }

    Ok(())
}
