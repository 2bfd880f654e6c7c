use std::sync::Arc;

use crate::application::{QueryHandler, RagService};
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub query_handler: Arc<QueryHandler>,
    pub rag_service: Arc<RagService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(query_handler: QueryHandler, rag_service: Arc<RagService>, config: AppConfig) -> Self {
        Self {
            query_handler: Arc::new(query_handler),
            rag_service,
            config: Arc::new(config),
        }
    }
}
