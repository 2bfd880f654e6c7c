use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::domain::{ports::ResponseChannel, DomainError, StructuredMessage};

/// Collects every message for a single JSON reply.
#[derive(Default)]
pub struct BufferedChannel {
    messages: Mutex<Vec<StructuredMessage>>,
}

impl BufferedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_messages(self) -> Vec<StructuredMessage> {
        self.messages
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ResponseChannel for BufferedChannel {
    async fn send_message(&self, message: StructuredMessage) -> Result<(), DomainError> {
        self.messages
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .push(message);
        Ok(())
    }
}

/// Forwards messages to a receiver as they are produced, e.g. an SSE body.
pub struct StreamingChannel {
    tx: mpsc::UnboundedSender<StructuredMessage>,
}

impl StreamingChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StructuredMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ResponseChannel for StreamingChannel {
    async fn send_message(&self, message: StructuredMessage) -> Result<(), DomainError> {
        self.tx
            .send(message)
            .map_err(|_| DomainError::internal("response stream closed by client"))
    }
}
