use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One inbound query together with the history the caller supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySession {
    pub session_id: String,
    pub query: String,
    pub site: Option<String>,
    pub turns: Vec<Turn>,
    pub streaming: bool,
    pub params: BTreeMap<String, String>,
}

impl QuerySession {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            query: query.into(),
            site: None,
            turns: Vec::new(),
            streaming: false,
            params: BTreeMap::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Pairs previous queries with previous answers by position. A query
    /// without a matching answer keeps `None`; surplus answers are dropped.
    pub fn with_history(mut self, prev_queries: Vec<String>, prev_answers: Vec<String>) -> Self {
        let mut answers = prev_answers.into_iter();
        self.turns = prev_queries
            .into_iter()
            .map(|query| Turn {
                query,
                answer: answers.next(),
            })
            .collect();
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn query_type(&self) -> QueryType {
        self.param("query_type")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Flattens the turns into alternating user/assistant messages.
    pub fn history(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|turn| {
                let user = Some(Message::new(MessageRole::User, &turn.query));
                let assistant = turn
                    .answer
                    .as_ref()
                    .map(|a| Message::new(MessageRole::Assistant, a));
                user.into_iter().chain(assistant)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// Intent of a payment-processing question, supplied by the caller as the
/// `query_type` param.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    General,
    Approval,
    Fees,
    Compliance,
    Chargebacks,
    Reserves,
    Termination,
    Alternatives,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Approval => "approval",
            Self::Fees => "fees",
            Self::Compliance => "compliance",
            Self::Chargebacks => "chargebacks",
            Self::Reserves => "reserves",
            Self::Termination => "termination",
            Self::Alternatives => "alternatives",
        }
    }

    /// Extra instruction appended to the prompt for this intent.
    pub fn focus(&self) -> Option<&'static str> {
        match self {
            Self::General => None,
            Self::Approval => Some(
                "Focus on merchant account approval process, requirements, and timeline.",
            ),
            Self::Fees => {
                Some("Explain fee structures, pricing models, and factors affecting rates.")
            }
            Self::Compliance => {
                Some("Detail compliance requirements, regulations, and best practices.")
            }
            Self::Chargebacks => {
                Some("Provide chargeback prevention strategies and dispute management tips.")
            }
            Self::Reserves => Some("Explain rolling reserves, their purpose, and how they work."),
            Self::Termination => Some(
                "Address account termination issues, MATCH list implications, and recovery options.",
            ),
            Self::Alternatives => {
                Some("Suggest alternative payment solutions and backup processing options.")
            }
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "approval" => Ok(Self::Approval),
            "fees" => Ok(Self::Fees),
            "compliance" => Ok(Self::Compliance),
            "chargebacks" => Ok(Self::Chargebacks),
            "reserves" => Ok(Self::Reserves),
            "termination" => Ok(Self::Termination),
            "alternatives" => Ok(Self::Alternatives),
            other => Err(format!("unknown query type: {other}")),
        }
    }
}

/// Which model tier a prompt should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    High,
    Low,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}
