use serde::{Deserialize, Serialize};

pub const NLWS_MESSAGE_TYPE: &str = "nlws";

pub const FALLBACK_ANSWER: &str = "I encountered an error while processing your payment-related query. Please try again or contact our support team.";

/// Unit of output written to a response channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredMessage {
    pub message_type: String,
    pub answer: String,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl StructuredMessage {
    pub fn nlws(answer: impl Into<String>) -> Self {
        Self {
            message_type: NLWS_MESSAGE_TYPE.to_string(),
            answer: answer.into(),
            items: Vec::new(),
        }
    }

    pub fn fallback() -> Self {
        Self::nlws(FALLBACK_ANSWER)
    }

    pub fn with_items(mut self, items: Vec<serde_json::Value>) -> Self {
        self.items = items;
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.message_type == NLWS_MESSAGE_TYPE && self.answer == FALLBACK_ANSWER
    }
}
