use async_trait::async_trait;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{ports::ResponseChannel, DomainError, QuerySession, StructuredMessage};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Domain logic for one site: turns a session into the message to emit.
#[async_trait]
pub trait SubHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn answer(&self, session: &QuerySession) -> Result<StructuredMessage, DomainError>;
}

/// Routes a session to its sub-handler and writes exactly one message to the
/// channel, substituting the fallback message for any failure.
pub struct QueryHandler {
    routes: HashMap<String, Arc<dyn SubHandler>>,
    default: Arc<dyn SubHandler>,
    timeout: Duration,
}

impl QueryHandler {
    pub fn new(default: Arc<dyn SubHandler>) -> Self {
        Self {
            routes: HashMap::new(),
            default,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_route(mut self, site: &str, handler: Arc<dyn SubHandler>) -> Self {
        self.routes.insert(site.to_lowercase(), handler);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn select(&self, site: Option<&str>) -> &Arc<dyn SubHandler> {
        site.and_then(|s| self.routes.get(&s.to_lowercase()))
            .unwrap_or(&self.default)
    }

    #[instrument(skip_all, fields(session_id = %session.session_id, site = ?session.site, handler = tracing::field::Empty))]
    pub async fn handle(&self, session: &QuerySession, channel: &dyn ResponseChannel) {
        let handler = self.select(session.site.as_deref());
        tracing::Span::current().record("handler", handler.name());
        tracing::info!(query = %session.query, turns = session.turns.len(), "query received");

        let run = AssertUnwindSafe(handler.answer(session)).catch_unwind();
        let message = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(Ok(message))) => {
                tracing::info!(items = message.items.len(), "query answered");
                message
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "sub-handler failed");
                StructuredMessage::fallback()
            }
            Ok(Err(_panic)) => {
                tracing::error!("sub-handler panicked");
                StructuredMessage::fallback()
            }
            Err(_) => {
                tracing::error!(timeout_secs = self.timeout.as_secs(), "sub-handler timed out");
                StructuredMessage::fallback()
            }
        };

        if let Err(e) = channel.send_message(message).await {
            tracing::error!(error = %e, "failed to deliver message");
        }
    }
}
