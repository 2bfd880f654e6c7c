use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::application::services::{RagService, SubHandler};
use crate::domain::{
    ports::LlmService, DomainError, ExpectedFields, LlmAnswer, QualityLevel, QuerySession,
    SearchHit, SiteFilter, StructuredMessage,
};
use crate::infrastructure::config::PaymentPrompts;

const NOT_SPECIFIED: &str = "Not specified";

/// Consultant for high-risk payment processing questions.
pub struct PaymentAdvisor {
    llm: Arc<dyn LlmService>,
    prompts: PaymentPrompts,
    retrieval: Option<Retrieval>,
}

struct Retrieval {
    rag: Arc<RagService>,
    site: SiteFilter,
    top_k: usize,
}

impl PaymentAdvisor {
    pub fn new(llm: Arc<dyn LlmService>, prompts: PaymentPrompts) -> Self {
        Self {
            llm,
            prompts,
            retrieval: None,
        }
    }

    /// Enriches prompts with the `top_k` closest documents from `site`.
    pub fn with_retrieval(mut self, rag: Arc<RagService>, site: &str, top_k: usize) -> Self {
        self.retrieval = Some(Retrieval {
            rag,
            site: SiteFilter::parse(Some(site)),
            top_k,
        });
        self
    }

    pub fn sites(&self) -> &[String] {
        &self.prompts.sites
    }

    /// A failed search degrades to an answer without reference material.
    async fn retrieve_context(&self, session: &QuerySession) -> Vec<SearchHit> {
        let Some(retrieval) = &self.retrieval else {
            return Vec::new();
        };

        match retrieval
            .rag
            .retrieve_top_k(&session.query, &retrieval.site, retrieval.top_k)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, answering without context");
                Vec::new()
            }
        }
    }

    pub fn build_prompt(&self, session: &QuerySession, context: &[SearchHit]) -> String {
        let param = |key: &str| session.param(key).unwrap_or(NOT_SPECIFIED);
        let query_type = session.query_type();

        let mut prompt = format!(
            "The user has a question about high-risk payment processing: {}\n\
             Query type: {}\n\
             Business vertical: {}\n\
             Specific concern: {}\n\
             Urgency: {}\n\
             Current status: {}\n\n\
             {}\n",
            session.query,
            query_type,
            param("business_vertical"),
            param("specific_concern"),
            param("urgency"),
            param("current_status"),
            self.prompts.guidelines.trim_end(),
        );

        if let Some(focus) = query_type.focus() {
            prompt.push('\n');
            prompt.push_str(focus);
            prompt.push('\n');
        }

        let history = session.history();
        if !history.is_empty() {
            let lines = history
                .iter()
                .map(|m| format!("{}: {}", m.role.as_str(), m.content))
                .collect::<Vec<_>>()
                .join("\n");
            prompt.push_str("\nPrevious conversation:\n");
            prompt.push_str(&lines);
            prompt.push('\n');
        }

        if !context.is_empty() {
            let docs = context
                .iter()
                .enumerate()
                .map(|(i, hit)| {
                    format!(
                        "[{}] {} ({})\n{}",
                        i + 1,
                        hit.document.name,
                        hit.document.url,
                        hit.document.payload
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            prompt.push_str("\nReference material from the knowledge base:\n");
            prompt.push_str(&docs);
            prompt.push('\n');
        }

        prompt.push_str("\nRespond with a single JSON object with these fields:\n");
        prompt.push_str(&LlmAnswer::schema_hint());
        prompt
    }
}

#[async_trait]
impl SubHandler for PaymentAdvisor {
    fn name(&self) -> &'static str {
        "payment_advisor"
    }

    #[instrument(skip(self, session), fields(query_type = %session.query_type()))]
    async fn answer(&self, session: &QuerySession) -> Result<StructuredMessage, DomainError> {
        let context = self.retrieve_context(session).await;
        let prompt = self.build_prompt(session, &context);

        let raw = self
            .llm
            .complete(QualityLevel::High, &self.prompts.system, &prompt)
            .await?;
        let answer = LlmAnswer::parse_reply(&raw)?;

        let items = context.iter().map(|hit| hit.document.to_item()).collect();
        Ok(StructuredMessage::nlws(answer.to_markdown()).with_items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ports::EmbeddingService, Document, Embedding};
    use crate::infrastructure::InMemoryVectorStore;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records prompts and replies with a canned response.
    struct ScriptedLlm {
        reply: Result<String, String>,
        prompts: Mutex<Vec<(QualityLevel, String)>>,
    }

    impl ScriptedLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("rate limited".to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> (QualityLevel, String) {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LlmService for ScriptedLlm {
        async fn complete(
            &self,
            level: QualityLevel,
            _system: &str,
            prompt: &str,
        ) -> Result<String, DomainError> {
            self.prompts.lock().unwrap().push((level, prompt.to_string()));
            self.reply.clone().map_err(DomainError::external)
        }
    }

    struct UnitEmbedding;

    #[async_trait]
    impl EmbeddingService for UnitEmbedding {
        async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
            Ok(Embedding::new(vec![1.0, 0.0]))
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
            Ok(texts.iter().map(|_| Embedding::new(vec![1.0, 0.0])).collect())
        }
    }

    const REPLY: &str = r#"{"answer": "A rolling reserve holds 5-10% of volume.", "next_steps": ["Ask about release schedules"], "disclaimer": "Terms vary."}"#;

    #[tokio::test]
    async fn test_answer_formats_markdown() {
        let llm = Arc::new(ScriptedLlm::replying(REPLY));
        let advisor = PaymentAdvisor::new(llm.clone(), PaymentPrompts::default());

        let session = QuerySession::new("Can you explain how rolling reserves work?")
            .with_param("query_type", "reserves");
        let message = advisor.answer(&session).await.unwrap();

        assert_eq!(message.message_type, "nlws");
        assert_eq!(
            message.answer,
            "A rolling reserve holds 5-10% of volume.\n\n\n### Next Steps\n- Ask about release schedules\n\n*Note: Terms vary.*"
        );
        assert!(message.items.is_empty());

        let (level, prompt) = llm.last_prompt();
        assert_eq!(level, QualityLevel::High);
        assert!(prompt.contains("Query type: reserves"));
        assert!(prompt.contains("Explain rolling reserves, their purpose, and how they work."));
    }

    #[tokio::test]
    async fn test_prompt_includes_params_and_history() {
        let llm = Arc::new(ScriptedLlm::replying(REPLY));
        let advisor = PaymentAdvisor::new(llm.clone(), PaymentPrompts::default());

        let session = QuerySession::new("I run an online supplement store")
            .with_param("business_vertical", "nutraceuticals")
            .with_history(
                vec!["What documents do I need to apply?".into()],
                vec!["List of required documents...".into()],
            );
        let prompt = advisor.build_prompt(&session, &[]);

        assert!(prompt.contains("Business vertical: nutraceuticals"));
        assert!(prompt.contains("Urgency: Not specified"));
        assert!(prompt.contains("User: What documents do I need to apply?"));
        assert!(prompt.contains("Assistant: List of required documents..."));
        assert!(prompt.contains("\"next_steps\""));
        assert!(!prompt.contains("Reference material"));
        assert!(!prompt.contains("Focus on"));
    }

    #[tokio::test]
    async fn test_retrieval_adds_context_and_items() {
        let store = Arc::new(InMemoryVectorStore::new("test", 2));
        let rag = Arc::new(RagService::new(Arc::new(UnitEmbedding), store, 3));
        rag.index_document(&Document::new(
            "https://zenti.com/",
            "What is a rolling reserve?",
            "Zenti",
            json!({"text": "typically 5-10% held for 6-12 months"}),
        ))
        .await
        .unwrap();
        rag.index_document(&Document::new("https://other/", "Other", "Other", json!({})))
            .await
            .unwrap();

        let llm = Arc::new(ScriptedLlm::replying(REPLY));
        let advisor =
            PaymentAdvisor::new(llm.clone(), PaymentPrompts::default()).with_retrieval(rag, "Zenti", 3);

        let message = advisor
            .answer(&QuerySession::new("rolling reserves?"))
            .await
            .unwrap();

        assert_eq!(message.items.len(), 1);
        assert_eq!(message.items[0]["name"], "What is a rolling reserve?");
        let (_, prompt) = llm.last_prompt();
        assert!(prompt.contains("[1] What is a rolling reserve? (https://zenti.com/)"));
        assert!(prompt.contains("6-12 months"));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let advisor = PaymentAdvisor::new(Arc::new(ScriptedLlm::failing()), PaymentPrompts::default());
        let err = advisor.answer(&QuerySession::new("q")).await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_invalid_response() {
        let advisor = PaymentAdvisor::new(
            Arc::new(ScriptedLlm::replying("Sorry, I can't do JSON today.")),
            PaymentPrompts::default(),
        );
        let err = advisor.answer(&QuerySession::new("q")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidResponse(_)));
    }
}
