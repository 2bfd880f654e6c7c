use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    Document, DomainError, Embedding, SearchHit, SiteFilter,
};

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
    embed_timeout: Duration,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    #[instrument(skip(self))]
    pub async fn ensure_ready(&self) -> Result<(), DomainError> {
        self.vector_store.ensure_collection().await
    }

    #[instrument(skip(self, query), fields(top_k = self.default_top_k))]
    pub async fn retrieve(
        &self,
        query: &str,
        site: &SiteFilter,
    ) -> Result<Vec<SearchHit>, DomainError> {
        self.retrieve_top_k(query, site, self.default_top_k).await
    }

    #[instrument(skip(self, query), fields(site = ?site.as_site()))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        site: &SiteFilter,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let embedding = self.embed(query).await?;
        self.vector_store.search(&embedding, site, top_k).await
    }

    /// Embeds the document's serialized payload and stores it as a new point.
    #[instrument(skip(self, document), fields(name = %document.name, site = %document.site))]
    pub async fn index_document(&self, document: &Document) -> Result<Uuid, DomainError> {
        let text = document.json_str()?;
        let embedding = self.embed(&text).await?;
        if embedding.is_degenerate() {
            return Err(DomainError::external("embedding provider returned an empty vector"));
        }
        self.vector_store.store(document, &embedding).await
    }

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        tokio::time::timeout(self.embed_timeout, self.embedding.embed(text))
            .await
            .map_err(|_| {
                DomainError::timeout(format!(
                    "embedding provider did not answer within {}s",
                    self.embed_timeout.as_secs_f32()
                ))
            })?
    }
}
