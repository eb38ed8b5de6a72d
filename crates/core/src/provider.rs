//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a single prompt to a model and get the
//! completion text back, and optionally how to embed texts. Every prompt the
//! agent issues is self-contained (history is rendered into the prompt), so
//! requests carry one prompt rather than a message list.
//!
//! Implementations: OpenAI-compatible endpoints, fallback chains.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "google/gemini-2.0-flash-001", "gpt-4o-mini")
    pub model: String,

    /// The complete prompt, sent as a single user message
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ProviderRequest {
    /// Build a request with the default temperature and no token cap.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated text
    pub text: String,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The model to use for embeddings (e.g., "text-embedding-3-small").
    pub model: String,

    /// The texts to embed.
    pub inputs: Vec<String>,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vectors, one per input text.
    pub embeddings: Vec<Vec<f32>>,

    /// Which model was used.
    pub model: String,

    /// Token usage.
    pub usage: Option<Usage>,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The generator wraps a provider
/// with timeouts and retries; nothing above the generator knows which
/// provider is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Generate embeddings for the given texts.
    ///
    /// Default implementation returns an error indicating embeddings aren't supported.
    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            format!("Provider '{}' does not support embeddings", self.name()),
        ))
    }

    /// Whether the provider endpoint is reachable.
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let req = ProviderRequest::new("gpt-4o-mini", "Summarize this conversation");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn request_deserializes_with_default_temperature() {
        let req: ProviderRequest =
            serde_json::from_str(r#"{"model":"m","prompt":"p"}"#).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
    }

    struct Plain;

    #[async_trait]
    impl Provider for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                text: request.prompt,
                usage: None,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn embed_defaults_to_not_configured() {
        let err = Plain
            .embed(EmbeddingRequest {
                model: "e".into(),
                inputs: vec!["x".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(Plain.health_check().await.unwrap());
    }
}
