use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    ports::VectorStore, Document, DomainError, Embedding, SearchHit, SiteFilter,
};

struct Point {
    document: Document,
    embedding: Embedding,
}

/// Brute-force cosine search over points held in process memory. Used for
/// local runs and tests; contents are lost on exit.
pub struct InMemoryVectorStore {
    collection: String,
    dimension: usize,
    points: RwLock<Option<Vec<Point>>>,
    creations: AtomicUsize,
}

impl InMemoryVectorStore {
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            points: RwLock::new(None),
            creations: AtomicUsize::new(0),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// How many times the collection was actually created.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Number of stored points, `None` before the collection exists.
    pub fn point_count(&self) -> Option<usize> {
        self.points.read().ok()?.as_ref().map(Vec::len)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let mut points = self
            .points
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        if points.is_none() {
            *points = Some(Vec::new());
            self.creations.fetch_add(1, Ordering::SeqCst);
            tracing::info!(collection = %self.collection, dimension = self.dimension, "creating collection");
        }
        Ok(())
    }

    async fn store(&self, document: &Document, embedding: &Embedding) -> Result<Uuid, DomainError> {
        if embedding.dimension() != self.dimension {
            return Err(DomainError::validation(format!(
                "vector has {} dimensions, collection expects {}",
                embedding.dimension(),
                self.dimension
            )));
        }
        self.ensure_collection().await?;

        let mut points = self
            .points
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let id = Uuid::new_v4();
        points.get_or_insert_with(Vec::new).push(Point {
            document: document.clone(),
            embedding: embedding.clone(),
        });
        Ok(id)
    }

    async fn search(
        &self,
        query: &Embedding,
        site: &SiteFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let points = self
            .points
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let Some(points) = points.as_ref() else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = points
            .iter()
            .filter(|p| site.matches(&p.document.site))
            .map(|p| SearchHit {
                document: p.document.clone(),
                score: query.cosine_similarity(&p.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}
