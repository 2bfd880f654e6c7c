mod loader;
mod payment;
mod query;
mod rag;

pub use loader::{KnowledgeBaseLoader, LoadReport};
pub use payment::PaymentAdvisor;
pub use query::{QueryHandler, SubHandler, DEFAULT_TIMEOUT};
pub use rag::RagService;
