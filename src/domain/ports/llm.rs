use crate::domain::{errors::DomainError, QualityLevel};
use async_trait::async_trait;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(
        &self,
        level: QualityLevel,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError>;
}
