//! Embeddings through a provider's `/embeddings` endpoint.

use async_trait::async_trait;
use heartline_core::error::IndexError;
use heartline_core::exemplar::Embedder;
use heartline_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;

/// Adapts a [`Provider`] to the index-facing [`Embedder`] trait.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    label: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let model = model.into();
        let label = format!("{}/{}", provider.name(), model);
        Self {
            provider,
            model,
            label,
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        &self.label
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await
            .map_err(|e| IndexError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(IndexError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }
}
