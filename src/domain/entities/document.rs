use serde::{Deserialize, Serialize};

/// Sentinel site value that disables the site filter.
pub const ALL_SITES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub name: String,
    pub site: String,
    pub payload: serde_json::Value,
}

impl Document {
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        site: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            site: site.into(),
            payload,
        }
    }

    /// Compact JSON text of the payload. This is both the text that gets
    /// embedded and the `json_str` field of the stored point.
    pub fn json_str(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }

    /// Rebuilds a document from a stored point's payload fields.
    pub fn from_stored(url: String, json_str: &str, name: String, site: String) -> Self {
        let payload = serde_json::from_str(json_str)
            .unwrap_or_else(|_| serde_json::Value::String(json_str.to_string()));
        Self {
            url,
            name,
            site,
            payload,
        }
    }

    /// Shape used for supporting items in structured messages.
    pub fn to_item(&self) -> serde_json::Value {
        serde_json::json!({
            "url": self.url,
            "name": self.name,
            "site": self.site,
            "schema_object": self.payload,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SiteFilter {
    #[default]
    All,
    Exact(String),
}

impl SiteFilter {
    /// Absent, empty, and `"all"` mean no filter. Anything else is an exact,
    /// case-sensitive match on the `site` field.
    pub fn parse(site: Option<&str>) -> Self {
        match site {
            None => Self::All,
            Some(s) if s.is_empty() || s == ALL_SITES => Self::All,
            Some(s) => Self::Exact(s.to_string()),
        }
    }

    pub fn matches(&self, site: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => expected == site,
        }
    }

    pub fn as_site(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Exact(site) => Some(site),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: Document,
    pub score: f32,
}

/// On-disk knowledge base: one site and the items published under it.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBase {
    pub site: String,
    pub items: Vec<KnowledgeItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeItem {
    pub name: String,
    pub url: String,
    pub schema_object: serde_json::Value,
}

impl KnowledgeItem {
    pub fn into_document(self, site: &str) -> Document {
        Document::new(self.url, self.name, site, self.schema_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_site_filter_parse() {
        assert_eq!(SiteFilter::parse(None), SiteFilter::All);
        assert_eq!(SiteFilter::parse(Some("")), SiteFilter::All);
        assert_eq!(SiteFilter::parse(Some("all")), SiteFilter::All);
        assert_eq!(
            SiteFilter::parse(Some("Zenti")),
            SiteFilter::Exact("Zenti".to_string())
        );
    }

    #[test]
    fn test_site_filter_is_case_sensitive() {
        let filter = SiteFilter::parse(Some("Zenti"));
        assert!(filter.matches("Zenti"));
        assert!(!filter.matches("zenti"));
        assert!(SiteFilter::All.matches("anything"));
    }

    #[test]
    fn test_from_stored_keeps_non_json_text() {
        let doc = Document::from_stored(
            "https://zenti.com/".into(),
            "not json",
            "Zenti".into(),
            "Zenti".into(),
        );
        assert_eq!(doc.payload, json!("not json"));
    }

    #[test]
    fn test_json_str_roundtrips_through_from_stored() {
        let doc = Document::new(
            "https://zenti.com/",
            "What is a rolling reserve?",
            "Zenti",
            json!({"@type": "FAQPage", "name": "What is a rolling reserve?"}),
        );
        let stored = doc.json_str().unwrap();
        let restored = Document::from_stored(
            doc.url.clone(),
            &stored,
            doc.name.clone(),
            doc.site.clone(),
        );
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_knowledge_base_requires_fields() {
        let missing_url = r#"{"site": "Zenti", "items": [{"name": "x", "schema_object": {}}]}"#;
        assert!(serde_json::from_str::<KnowledgeBase>(missing_url).is_err());

        let ok = r#"{"site": "Zenti", "items": [{"name": "x", "url": "u", "schema_object": {"a": 1}}]}"#;
        let kb: KnowledgeBase = serde_json::from_str(ok).unwrap();
        let doc = kb.items[0].clone().into_document(&kb.site);
        assert_eq!(doc.site, "Zenti");
        assert_eq!(doc.payload, json!({"a": 1}));
    }
}
