//! Explicit construction of every provider and service from configuration.
//! Both binaries build their object graph here at startup and pass it down.

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::{PaymentAdvisor, QueryHandler, RagService};
use crate::domain::{
    ports::{EmbeddingService, LlmService, VectorStore},
    DomainError,
};
use crate::infrastructure::config::{AppConfig, Config, LlmConfig};
use crate::infrastructure::{
    AnthropicLlm, InMemoryVectorStore, OpenAiLlm, QdrantVectorStore, TextEmbedding,
    VectorStoreBackend,
};

/// `LOG_FORMAT=json` switches to JSON lines; `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

pub fn build_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>, DomainError> {
    let dimension = config.embedding.dimension;
    let store: Arc<dyn VectorStore> = match config.vector_store.backend {
        VectorStoreBackend::Qdrant => Arc::new(QdrantVectorStore::from_config(
            &config.vector_store,
            dimension,
        )?),
        VectorStoreBackend::Memory => Arc::new(InMemoryVectorStore::new(
            &config.vector_store.collection,
            dimension,
        )),
    };
    tracing::info!(
        backend = ?config.vector_store.backend,
        collection = %config.vector_store.collection,
        dimension,
        "vector store configured"
    );
    Ok(store)
}

pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmService>, DomainError> {
    match config.provider.to_ascii_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiLlm::from_config(config))),
        "anthropic" => Ok(Arc::new(AnthropicLlm::from_config(config))),
        other => Err(DomainError::validation(format!("unknown LLM provider: {other}"))),
    }
}

pub fn build_rag(config: &Config) -> Result<Arc<RagService>, DomainError> {
    let embedding: Arc<dyn EmbeddingService> = Arc::new(TextEmbedding::from_config(&config.embedding));
    let vector_store = build_vector_store(config)?;
    Ok(Arc::new(
        RagService::new(embedding, vector_store, config.rag.top_k)
            .with_embed_timeout(Duration::from_secs(config.embedding.timeout_seconds)),
    ))
}

/// The payment advisor is both the default handler and the handler for every
/// configured Zenti site.
pub fn build_query_handler(
    app: &AppConfig,
    llm: Arc<dyn LlmService>,
    rag: Arc<RagService>,
) -> QueryHandler {
    let config = &app.config;
    let mut advisor = PaymentAdvisor::new(llm, app.prompts.payment.clone());
    if config.rag.enabled {
        advisor = advisor.with_retrieval(rag, &config.rag.site, config.rag.top_k);
    }

    let sites = advisor.sites().to_vec();
    let advisor = Arc::new(advisor);
    sites.iter().fold(
        QueryHandler::new(advisor.clone())
            .with_timeout(Duration::from_secs(config.llm.timeout_seconds)),
        |handler, site| handler.with_route(site, advisor.clone()),
    )
}
