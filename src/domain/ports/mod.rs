mod embedding;
mod llm;
mod response_channel;
mod vector_store;

pub use embedding::EmbeddingService;
pub use llm::LlmService;
pub use response_channel::ResponseChannel;
pub use vector_store::VectorStore;
