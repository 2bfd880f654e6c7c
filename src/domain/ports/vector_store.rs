use crate::domain::{errors::DomainError, Document, Embedding, SearchHit, SiteFilter};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection if it does not exist yet. Safe to call
    /// repeatedly and concurrently.
    async fn ensure_collection(&self) -> Result<(), DomainError>;

    /// Stores one point under a fresh id. Identical documents are not
    /// deduplicated.
    async fn store(&self, document: &Document, embedding: &Embedding)
        -> Result<Uuid, DomainError>;

    /// Nearest neighbours by descending similarity. Backend failures are
    /// errors, never an empty result.
    async fn search(
        &self,
        query: &Embedding,
        site: &SiteFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError>;
}
