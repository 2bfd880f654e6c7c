use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType,
    Filter, PointStruct, ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tokio::sync::OnceCell;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    ports::VectorStore, Document, DomainError, Embedding, SearchHit, SiteFilter,
};
use crate::infrastructure::config::VectorStoreConfig;

/// Payload fields that get a keyword index for equality filtering.
const INDEXED_FIELDS: [&str; 3] = ["url", "name", "site"];

pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
    ready: OnceCell<()>,
}

impl QdrantVectorStore {
    /// Builds the client without touching the collection; it is created on
    /// first use.
    pub fn new(
        url: &str,
        api_key: Option<&str>,
        collection: &str,
        dimension: usize,
    ) -> Result<Self, DomainError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
            ready: OnceCell::new(),
        })
    }

    pub fn from_config(config: &VectorStoreConfig, dimension: usize) -> Result<Self, DomainError> {
        Self::new(
            &config.url,
            config.api_key.as_deref(),
            &config.collection,
            dimension,
        )
    }

    async fn create_collection_if_missing(&self) -> Result<(), DomainError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if exists {
            return Ok(());
        }

        tracing::info!(collection = %self.collection, dimension = self.dimension, "creating collection");
        let created = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await;

        match created {
            Ok(_) => {}
            // Another process won the race.
            Err(e) if is_already_exists(&e.to_string()) => {
                tracing::debug!(collection = %self.collection, "collection created concurrently");
                return Ok(());
            }
            Err(e) => return Err(DomainError::external(e.to_string())),
        }

        for field in INDEXED_FIELDS {
            let indexed = self
                .client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await;
            if let Err(e) = indexed {
                tracing::warn!(collection = %self.collection, field, error = %e, "payload index not created");
            }
        }

        Ok(())
    }

    fn hit_from_point(point: ScoredPoint) -> Option<SearchHit> {
        let payload = point.payload;
        let field = |name: &str| payload.get(name)?.as_str().map(|s| s.to_string());

        let document = Document::from_stored(
            field("url")?,
            &field("json_str")?,
            field("name")?,
            field("site")?,
        );

        Some(SearchHit {
            document,
            score: point.score,
        })
    }
}

/// Qdrant reports a lost creation race as a "Wrong input" error whose
/// message names the existing collection.
fn is_already_exists(message: &str) -> bool {
    message.to_ascii_lowercase().contains("already exists")
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn ensure_collection(&self) -> Result<(), DomainError> {
        self.ready
            .get_or_try_init(|| self.create_collection_if_missing())
            .await?;
        Ok(())
    }

    #[instrument(skip(self, document, embedding), fields(name = %document.name, site = %document.site))]
    async fn store(&self, document: &Document, embedding: &Embedding) -> Result<Uuid, DomainError> {
        if embedding.dimension() != self.dimension {
            return Err(DomainError::validation(format!(
                "vector has {} dimensions, collection expects {}",
                embedding.dimension(),
                self.dimension
            )));
        }
        self.ensure_collection().await?;

        let json_str = document.json_str()?;
        let payload: Payload = serde_json::json!({
            "url": document.url,
            "json_str": json_str,
            "name": document.name,
            "site": document.site,
        })
        .try_into()
        .map_err(|_| DomainError::internal("Failed to create payload"))?;

        let id = Uuid::new_v4();
        let point = PointStruct::new(id.to_string(), embedding.as_slice().to_vec(), payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        tracing::debug!(point_id = %id, "stored document");
        Ok(id)
    }

    #[instrument(skip(self, query), fields(site = ?site.as_site()))]
    async fn search(
        &self,
        query: &Embedding,
        site: &SiteFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.ensure_collection().await?;

        let mut request =
            SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), limit as u64)
                .with_payload(true);
        if let SiteFilter::Exact(site) = site {
            request = request.filter(Filter::must([Condition::matches("site", site.clone())]));
        }

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let total = results.result.len();
        let hits: Vec<SearchHit> = results
            .result
            .into_iter()
            .filter_map(Self::hit_from_point)
            .collect();

        if hits.len() < total {
            tracing::warn!(skipped = total - hits.len(), "points with incomplete payload skipped");
        }

        Ok(hits)
    }
}
