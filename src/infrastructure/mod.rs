pub mod channel;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod vector_store;

pub use channel::{BufferedChannel, StreamingChannel};
pub use config::{AppConfig, Config, PromptsConfig, VectorStoreBackend};
pub use embedding::TextEmbedding;
pub use llm::{AnthropicLlm, OpenAiLlm};
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
