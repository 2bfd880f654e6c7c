mod answer;
mod conversation;
mod document;
mod embedding;
mod message;

pub use answer::{ExpectedFields, LlmAnswer};
pub use conversation::{Message, MessageRole, QualityLevel, QuerySession, QueryType, Turn};
pub use document::{Document, KnowledgeBase, KnowledgeItem, SearchHit, SiteFilter, ALL_SITES};
pub use embedding::Embedding;
pub use message::{StructuredMessage, FALLBACK_ANSWER, NLWS_MESSAGE_TYPE};
