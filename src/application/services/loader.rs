use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

use crate::application::services::RagService;
use crate::domain::{DomainError, KnowledgeBase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub site: String,
    pub stored: usize,
    pub skipped: Vec<String>,
}

/// One-shot import of a knowledge-base file into the vector store.
pub struct KnowledgeBaseLoader {
    rag: Arc<RagService>,
}

impl KnowledgeBaseLoader {
    pub fn new(rag: Arc<RagService>) -> Self {
        Self { rag }
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn load_file(&self, path: &Path) -> Result<LoadReport, DomainError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let kb: KnowledgeBase = serde_json::from_str(&raw)?;
        self.load(kb).await
    }

    /// Items are processed one at a time. An item that fails to embed or
    /// store is logged and skipped; only collection setup aborts the run.
    #[instrument(skip(self, kb), fields(site = %kb.site, items = kb.items.len()))]
    pub async fn load(&self, kb: KnowledgeBase) -> Result<LoadReport, DomainError> {
        self.rag.ensure_ready().await?;

        let mut report = LoadReport {
            site: kb.site.clone(),
            stored: 0,
            skipped: Vec::new(),
        };

        for item in kb.items {
            let name = item.name.clone();
            let document = item.into_document(&kb.site);

            match self.rag.index_document(&document).await {
                Ok(id) => {
                    tracing::info!(name = %name, point_id = %id, "stored item");
                    report.stored += 1;
                }
                Err(e) => {
                    tracing::error!(name = %name, error = %e, "failed to index item, skipping");
                    report.skipped.push(name);
                }
            }
        }

        tracing::info!(
            stored = report.stored,
            skipped = report.skipped.len(),
            "knowledge base load complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ports::EmbeddingService, ports::VectorStore, Embedding, SiteFilter};
    use crate::infrastructure::InMemoryVectorStore;
    use async_trait::async_trait;
    use std::io::Write;

    /// Fails for any text mentioning "poison", returns zeros for "blank".
    struct PickyEmbedding;

    #[async_trait]
    impl EmbeddingService for PickyEmbedding {
        async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
            if text.contains("poison") {
                return Err(DomainError::external("quota exceeded"));
            }
            if text.contains("blank") {
                return Ok(Embedding::new(vec![0.0, 0.0]));
            }
            Ok(Embedding::new(vec![1.0, 0.5]))
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    struct DownStore;

    #[async_trait]
    impl VectorStore for DownStore {
        async fn ensure_collection(&self) -> Result<(), DomainError> {
            Err(DomainError::external("connection refused"))
        }

        async fn store(
            &self,
            _document: &crate::domain::Document,
            _embedding: &Embedding,
        ) -> Result<uuid::Uuid, DomainError> {
            Err(DomainError::external("connection refused"))
        }

        async fn search(
            &self,
            _query: &Embedding,
            _site: &SiteFilter,
            _limit: usize,
        ) -> Result<Vec<crate::domain::SearchHit>, DomainError> {
            Err(DomainError::external("connection refused"))
        }
    }

    fn write_kb(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const KB: &str = r#"{
        "site": "Zenti",
        "items": [
            {"name": "good", "url": "https://zenti.com/a", "schema_object": {"text": "fine"}},
            {"name": "bad", "url": "https://zenti.com/b", "schema_object": {"text": "poison"}},
            {"name": "empty", "url": "https://zenti.com/c", "schema_object": {"text": "blank"}},
            {"name": "also good", "url": "https://zenti.com/d", "schema_object": {"text": "ok"}}
        ]
    }"#;

    #[tokio::test]
    async fn test_failed_items_are_skipped() {
        let store = Arc::new(InMemoryVectorStore::new("test", 2));
        let rag = Arc::new(RagService::new(Arc::new(PickyEmbedding), store.clone(), 5));
        let loader = KnowledgeBaseLoader::new(rag);

        let file = write_kb(KB);
        let report = loader.load_file(file.path()).await.unwrap();

        assert_eq!(report.site, "Zenti");
        assert_eq!(report.stored, 2);
        assert_eq!(report.skipped, vec!["bad".to_string(), "empty".to_string()]);
        assert_eq!(store.point_count(), Some(2));
    }

    #[tokio::test]
    async fn test_stored_items_carry_site_and_payload() {
        let store = Arc::new(InMemoryVectorStore::new("test", 2));
        let rag = Arc::new(RagService::new(Arc::new(PickyEmbedding), store.clone(), 5));
        let loader = KnowledgeBaseLoader::new(rag);

        loader.load_file(write_kb(KB).path()).await.unwrap();

        let hits = store
            .search(&Embedding::new(vec![1.0, 0.5]), &SiteFilter::All, 10)
            .await
            .unwrap();
        let good = hits.iter().find(|h| h.document.name == "good").unwrap();
        assert_eq!(good.document.site, "Zenti");
        assert_eq!(good.document.url, "https://zenti.com/a");
        assert_eq!(good.document.payload["text"], "fine");
    }

    #[tokio::test]
    async fn test_malformed_input_is_fatal() {
        let store = Arc::new(InMemoryVectorStore::new("test", 2));
        let rag = Arc::new(RagService::new(Arc::new(PickyEmbedding), store.clone(), 5));
        let loader = KnowledgeBaseLoader::new(rag);

        let file = write_kb(r#"{"site": "Zenti", "items": [{"name": "no url"}]}"#);
        let err = loader.load_file(file.path()).await.unwrap_err();

        assert!(matches!(err, DomainError::Serialization(_)));
        assert_eq!(store.point_count(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let store = Arc::new(InMemoryVectorStore::new("test", 2));
        let rag = Arc::new(RagService::new(Arc::new(PickyEmbedding), store, 5));
        let loader = KnowledgeBaseLoader::new(rag);

        let err = loader
            .load_file(Path::new("/nonexistent/kb.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
    }

    #[tokio::test]
    async fn test_collection_failure_is_fatal() {
        let rag = Arc::new(RagService::new(Arc::new(PickyEmbedding), Arc::new(DownStore), 5));
        let loader = KnowledgeBaseLoader::new(rag);

        let err = loader.load_file(write_kb(KB).path()).await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }
}
