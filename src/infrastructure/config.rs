use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, QualityLevel};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

/// Runtime settings plus prompt text, loaded once at bootstrap.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Reads `CONFIG_PATH`/`PROMPTS_PATH` (or the defaults), falling back to
    /// built-in values for missing files, then applies environment overrides.
    pub fn load() -> Result<Self, DomainError> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("PROMPTS_PATH").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());

        let mut config: Config = read_yaml_or_default(Path::new(&config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        let prompts: PromptsConfig = read_yaml_or_default(Path::new(&prompts_path))?;

        Ok(Self { config, prompts })
    }
}

fn read_yaml_or_default<T>(path: &Path) -> Result<T, DomainError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&raw)
        .map_err(|e| DomainError::validation(format!("{}: {e}", path.display())))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub cors: CorsConfig,
}

impl Config {
    /// Environment variables win over file values. `lookup` is injected so
    /// the mapping can be tested without touching the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SERVER_HOST").or_else(|| lookup("HOST")) {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(port, "ignoring unparsable port override"),
            }
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(backend) = lookup("VECTOR_STORE") {
            match backend.to_ascii_lowercase().as_str() {
                "qdrant" => self.vector_store.backend = VectorStoreBackend::Qdrant,
                "memory" => self.vector_store.backend = VectorStoreBackend::Memory,
                _ => tracing::warn!(backend, "ignoring unknown vector store override"),
            }
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(path) = lookup("KNOWLEDGE_BASE_PATH") {
            self.knowledge_base.path = PathBuf::from(path);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub high_model: String,
    pub low_model: String,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub fn model_for(&self, level: QualityLevel) -> &str {
        match level {
            QualityLevel::High => &self.high_model,
            QualityLevel::Low => &self.low_model,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            high_model: "gpt-4.1".to_string(),
            low_model: "gpt-4.1-mini".to_string(),
            max_tokens: 2048,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    #[default]
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorStoreBackend,
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::Qdrant,
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "nlweb_collection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub enabled: bool,
    pub top_k: usize,
    /// Site the knowledge base was loaded under; retrieval filters on it.
    pub site: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 5,
            site: "Zenti".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    pub path: PathBuf,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/zenti_knowledge_base.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PromptsConfig {
    pub payment: PaymentPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentPrompts {
    pub system: String,
    pub guidelines: String,
    /// Sites routed to the payment advisor, matched case-insensitively.
    pub sites: Vec<String>,
}

impl Default for PaymentPrompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_PAYMENT_SYSTEM.to_string(),
            guidelines: DEFAULT_PAYMENT_GUIDELINES.to_string(),
            sites: vec!["zenti".to_string(), "zenti.com".to_string()],
        }
    }
}

const DEFAULT_PAYMENT_SYSTEM: &str = "You are Zenti's payment processing consultant. \
You help high-risk merchants with merchant accounts, compliance, chargebacks, reserves, \
and alternative payment solutions. Answer only from well-established industry practice \
and the reference material you are given.";

const DEFAULT_PAYMENT_GUIDELINES: &str = "Provide a detailed, professional response that:
1. Directly addresses their specific concern
2. Provides accurate information about high-risk payment processing
3. Explains any relevant terms or concepts
4. Offers actionable next steps or recommendations
5. Maintains a helpful and consultative tone

Response should be formatted in markdown and include:
- Clear explanation of the topic
- Relevant details and considerations
- Next steps or recommendations
- Any important disclaimers or notes";
