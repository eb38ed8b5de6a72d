//! Provider router — selects the correct LLM provider based on config.
//!
//! Handles provider creation and assembles the primary provider plus its
//! configured fallbacks into the single provider the generator talks to.

use crate::fallback::FallbackProvider;
use crate::openai_compat::OpenAiCompatProvider;
use heartline_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    /// Per-provider model used when the provider serves as a fallback.
    fallback_models: HashMap<String, String>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            fallback_models: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Ask `name` for `model` whenever it answers as a fallback.
    pub fn set_fallback_model(&mut self, name: impl Into<String>, model: impl Into<String>) {
        self.fallback_models.insert(name.into(), model.into());
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// The default provider followed by `fallbacks`, as one provider.
    ///
    /// Unknown fallback names are skipped. A fallback with a configured
    /// `default_model` is asked for that model instead of the caller's. With
    /// no usable fallbacks the default provider is returned unwrapped.
    pub fn chain(&self, fallbacks: &[String], timeout: Duration) -> Option<Arc<dyn Provider>> {
        let primary = self.default()?;
        let extra: Vec<(&String, Arc<dyn Provider>)> = fallbacks
            .iter()
            .filter(|name| **name != self.default_provider)
            .filter_map(|name| {
                let found = self.get(name);
                if found.is_none() {
                    tracing::warn!(provider = %name, "Unknown fallback provider, skipping");
                }
                found.map(|provider| (name, provider))
            })
            .collect();

        if extra.is_empty() {
            return Some(primary);
        }

        let mut chain = FallbackProvider::new("fallback").add(primary, timeout);
        for (name, provider) in extra {
            chain = match self.fallback_models.get(name) {
                Some(model) => chain.add_with_model(provider, timeout, model),
                None => chain.add(provider, timeout),
            };
        }
        Some(Arc::new(chain))
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &heartline_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
        if let Some(model) = &provider_config.default_model {
            router.set_fallback_model(name.clone(), model.clone());
        }
    }

    // Ensure the default and fallback providers exist (even if not explicitly configured)
    let implicit = std::iter::once(&config.default_provider).chain(&config.fallback_providers);
    for name in implicit {
        if router.get(name).is_none() {
            let api_key = config.api_key.clone().unwrap_or_default();
            router.register(
                name.clone(),
                Arc::new(OpenAiCompatProvider::new(name, default_base_url(name), api_key)),
            );
        }
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
