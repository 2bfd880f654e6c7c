use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use zenti_agent::application::{KnowledgeBaseLoader, PaymentAdvisor, QueryHandler, RagService};
use zenti_agent::domain::ports::{EmbeddingService, LlmService};
use zenti_agent::domain::{DomainError, Embedding, QualityLevel, QuerySession, SiteFilter};
use zenti_agent::infrastructure::config::PaymentPrompts;
use zenti_agent::infrastructure::{BufferedChannel, InMemoryVectorStore};

const DIMENSION: usize = 16;
const QUERY: &str = "Can you explain how rolling reserves work?";
const RESERVE_FAQ: &str = "What is a rolling reserve?";

/// The reserve FAQ and the reserve question point almost the same way; every
/// other text gets its own axis, orthogonal to the query.
struct EngineeredEmbedding {
    next_axis: Mutex<usize>,
}

impl EngineeredEmbedding {
    fn new() -> Self {
        Self {
            next_axis: Mutex::new(0),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMENSION];
        if text.contains(RESERVE_FAQ) {
            v[0] = 1.0;
            v[1] = 0.1;
        } else if text.contains("rolling reserves work") {
            v[0] = 1.0;
        } else {
            let mut next = self.next_axis.lock().unwrap();
            v[2 + *next % (DIMENSION - 2)] = 1.0;
            *next += 1;
        }
        v
    }
}

#[async_trait]
impl EmbeddingService for EngineeredEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(Embedding::new(self.vector_for(text)))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts
            .iter()
            .map(|t| Embedding::new(self.vector_for(t)))
            .collect())
    }
}

struct EchoLlm {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmService for EchoLlm {
    async fn complete(
        &self,
        _level: QualityLevel,
        _system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(r#"```json
{"answer": "A rolling reserve is a share of volume the processor holds back.", "next_steps": "Ask your processor for the release schedule."}
```"#
            .to_string())
    }
}

async fn loaded_rag() -> (Arc<RagService>, Arc<InMemoryVectorStore>) {
    let store = Arc::new(InMemoryVectorStore::new("nlweb_collection", DIMENSION));
    let rag = Arc::new(RagService::new(
        Arc::new(EngineeredEmbedding::new()),
        store.clone(),
        5,
    ));

    let report = KnowledgeBaseLoader::new(rag.clone())
        .load_file(Path::new("data/zenti_knowledge_base.json"))
        .await
        .unwrap();
    assert_eq!(report.site, "Zenti");
    assert!(report.skipped.is_empty());
    assert_eq!(store.point_count(), Some(report.stored));

    (rag, store)
}

#[tokio::test]
async fn test_reserve_question_ranks_reserve_faq_first() {
    let (rag, _store) = loaded_rag().await;

    let hits = rag
        .retrieve(QUERY, &SiteFilter::parse(Some("Zenti")))
        .await
        .unwrap();

    assert!(!hits.is_empty());
    assert_eq!(hits[0].document.name, RESERVE_FAQ);
    assert!(hits[0].document.json_str().unwrap().contains("5-10%"));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_reserve_question_through_query_handler() {
    let (rag, _store) = loaded_rag().await;
    let llm = Arc::new(EchoLlm {
        prompts: Mutex::new(Vec::new()),
    });

    let advisor = Arc::new(
        PaymentAdvisor::new(llm.clone(), PaymentPrompts::default()).with_retrieval(rag, "Zenti", 3),
    );
    let handler = QueryHandler::new(advisor.clone()).with_route("zenti.com", advisor);

    let session = QuerySession::new(QUERY)
        .with_site("zenti.com")
        .with_param("query_type", "reserves");
    let channel = BufferedChannel::new();
    handler.handle(&session, &channel).await;
    let messages = channel.into_messages();

    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert!(!message.is_fallback());
    assert!(message.answer.contains("### Next Steps"));
    assert_eq!(message.items[0]["name"], RESERVE_FAQ);

    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("[1] What is a rolling reserve?"));
    assert!(prompts[0].contains("6-12 months"));
}
