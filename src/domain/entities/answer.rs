use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A typed result schema requested from the LLM. `FIELDS` lists the JSON
/// keys and the description the model is given for each.
pub trait ExpectedFields: DeserializeOwned {
    const FIELDS: &'static [(&'static str, &'static str)];

    fn schema_hint() -> String {
        let fields: serde_json::Map<String, serde_json::Value> = Self::FIELDS
            .iter()
            .map(|(name, desc)| (name.to_string(), serde_json::Value::from(*desc)))
            .collect();
        serde_json::Value::Object(fields).to_string()
    }

    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }

    /// Parses a raw model reply, tolerating markdown code fences and prose
    /// around the JSON object.
    fn parse_reply(raw: &str) -> Result<Self, DomainError> {
        let json = extract_json_object(raw)
            .ok_or_else(|| DomainError::invalid_response("no JSON object in reply"))?;
        let parsed: Self =
            serde_json::from_str(json).map_err(|e| DomainError::invalid_response(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAnswer {
    pub answer: String,
    #[serde(default, deserialize_with = "text_or_list")]
    pub next_steps: Option<String>,
    #[serde(default, deserialize_with = "text_or_list")]
    pub disclaimer: Option<String>,
}

impl ExpectedFields for LlmAnswer {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("answer", "detailed response in markdown format"),
        ("next_steps", "list of recommended actions"),
        ("disclaimer", "any important disclaimers or notes"),
    ];

    fn validate(&self) -> Result<(), DomainError> {
        if self.answer.trim().is_empty() {
            return Err(DomainError::invalid_response("empty answer field"));
        }
        Ok(())
    }
}

impl LlmAnswer {
    pub fn to_markdown(&self) -> String {
        let mut out = format!("{}\n\n", self.answer);
        if let Some(next_steps) = &self.next_steps {
            out.push_str("\n### Next Steps\n");
            out.push_str(next_steps);
        }
        if let Some(disclaimer) = &self.disclaimer {
            out.push_str("\n\n*Note: ");
            out.push_str(disclaimer);
            out.push('*');
        }
        out
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

/// Models return list fields either as prose or as a JSON array. Arrays are
/// rendered as a markdown bullet list; empty values become `None`.
fn text_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrList>::deserialize(deserializer)?;
    let text = match value {
        None => return Ok(None),
        Some(TextOrList::Text(text)) => text,
        Some(TextOrList::List(items)) => items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}
