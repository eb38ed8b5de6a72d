//! Configuration loading, validation, and management for Heartline.
//!
//! Loads configuration from `~/.heartline/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.heartline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Providers tried in order after the default one fails
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_providers: Vec<String>,

    /// Exemplar index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Conversation window configuration
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Timeouts and retries for external calls
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "google/gemini-2.0-flash-001".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("fallback_providers", &self.fallback_providers)
            .field("index", &self.index)
            .field("conversation", &self.conversation)
            .field("runtime", &self.runtime)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Where the exemplar corpus lives and how it is embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// "sqlite", "file", "memory", or "none"
    #[serde(default = "default_index_backend")]
    pub backend: String,

    /// Database or JSONL path; defaults under the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// "hashing" for the offline embedder, otherwise a provider name
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Vector width for the hashing embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Exemplars injected into the response prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_index_backend() -> String {
    "sqlite".into()
}
fn default_collection() -> String {
    "empathetic_data".into()
}
fn default_embedding_provider() -> String {
    "hashing".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_dimensions() -> usize {
    256
}
fn default_top_k() -> usize {
    3
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: default_index_backend(),
            path: None,
            collection: default_collection(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            dimensions: default_dimensions(),
            top_k: default_top_k(),
        }
    }
}

impl IndexConfig {
    /// The configured path, or the backend's default file under the config directory.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(p) => p.clone(),
            None => {
                let file = match self.backend.as_str() {
                    "file" => "exemplars.jsonl",
                    _ => "exemplars.db",
                };
                AppConfig::config_dir().join(file)
            }
        }
    }
}

/// How much conversation is rendered into prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Turns rendered into classifier and response prompts
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Turns rendered into the summarizer prompt
    #[serde(default = "default_summary_turns")]
    pub summary_turns: usize,
}

fn default_history_turns() -> usize {
    10
}
fn default_summary_turns() -> usize {
    8
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_turns: default_history_turns(),
            summary_turns: default_summary_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Per-attempt limit on a generation call
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Limit on one similarity query
    #[serde(default = "default_retrieval_timeout")]
    pub retrieval_timeout_secs: u64,

    /// Extra attempts after a transient generation failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_generation_timeout() -> u64 {
    60
}
fn default_retrieval_timeout() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    2
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: default_generation_timeout(),
            retrieval_timeout_secs: default_retrieval_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

const INDEX_BACKENDS: &[&str] = &["sqlite", "file", "memory", "none"];

impl AppConfig {
    /// Load configuration from the default path (~/.heartline/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `HEARTLINE_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("HEARTLINE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("HEARTLINE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("HEARTLINE_MODEL") {
            self.default_model = model;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".heartline")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !INDEX_BACKENDS.contains(&self.index.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "index.backend must be one of {}, got '{}'",
                INDEX_BACKENDS.join(", "),
                self.index.backend
            )));
        }

        if self.index.top_k == 0 {
            return Err(ConfigError::ValidationError("index.top_k must be > 0".into()));
        }

        if self.index.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "index.dimensions must be > 0".into(),
            ));
        }

        if self.conversation.history_turns == 0 || self.conversation.summary_turns == 0 {
            return Err(ConfigError::ValidationError(
                "conversation windows must be > 0".into(),
            ));
        }

        if self.runtime.generation_timeout_secs == 0 || self.runtime.retrieval_timeout_secs == 0 {
            return Err(ConfigError::ValidationError("timeouts must be > 0".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `heartline config --defaults`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            fallback_providers: vec![],
            index: IndexConfig::default(),
            conversation: ConversationConfig::default(),
            runtime: RuntimeConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
