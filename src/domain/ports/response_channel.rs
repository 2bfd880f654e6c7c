use crate::domain::{errors::DomainError, StructuredMessage};
use async_trait::async_trait;

/// Sink for the messages a query produces.
#[async_trait]
pub trait ResponseChannel: Send + Sync {
    async fn send_message(&self, message: StructuredMessage) -> Result<(), DomainError>;
}
