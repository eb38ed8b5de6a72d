//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any
//! endpoint exposing `/chat/completions` and `/embeddings`.
//!
//! Every prompt is sent as a single user message; the agent renders
//! history into the prompt text itself.

use async_trait::async_trait;
use heartline_core::error::ProviderError;
use heartline_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": [ApiMessage {
                role: "user".into(),
                content: Some(request.prompt.clone()),
            }],
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    /// Map a non-200 status to the matching provider error.
    async fn status_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        match status {
            429 => ProviderError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
                ProviderError::ApiError {
                    status_code: status,
                    message: error_body,
                }
            }
        }
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response, ProviderError> {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })
    }
}

#[async_trait]
impl heartline_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::chat_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "Sending completion request"
        );

        let response = self.post(&url, &body).await?;
        if response.status().as_u16() != 200 {
            return Err(self.status_error(response).await);
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            text,
            usage,
            model: api_response.model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        let url = format!("{}/embeddings", self.base_url);

        let body = serde_json::json!({
            "model": request.model,
            "input": request.inputs,
            "encoding_format": "float",
        });

        debug!(
            provider = %self.name,
            model = %request.model,
            count = request.inputs.len(),
            "Sending embedding request"
        );

        let response = self.post(&url, &body).await?;
        if response.status().as_u16() != 200 {
            return Err(self.status_error(response).await);
        }

        let api_resp: EmbeddingApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        let embeddings = api_resp.data.into_iter().map(|d| d.embedding).collect();
        let usage = api_resp.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: 0,
            total_tokens: u.total_tokens,
        });

        Ok(EmbeddingResponse {
            embeddings,
            model: api_resp.model,
            usage,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    model: String,
    usage: Option<EmbeddingApiUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartline_core::Provider;

    #[test]
    fn openrouter_constructor() {
        let provider = OpenAiCompatProvider::openrouter("sk-test");
        assert_eq!(provider.name(), "openrouter");
        assert!(provider.base_url().contains("openrouter.ai"));
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url().contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://host:8000/v1/", "k");
        assert_eq!(provider.base_url(), "http://host:8000/v1");
    }

    #[test]
    fn chat_body_wraps_prompt_as_single_user_message() {
        let mut req = ProviderRequest::new("gpt-4o-mini", "How are you feeling?");
        req.max_tokens = Some(256);
        let body = OpenAiCompatProvider::chat_body(&req);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "How are you feeling?");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn chat_body_omits_unset_max_tokens() {
        let req = ProviderRequest::new("m", "p");
        let body = OpenAiCompatProvider::chat_body(&req);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn parse_chat_response() {
        let data = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "I hear you."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("I hear you."));
        assert_eq!(parsed.usage.unwrap().total_tokens, 16);
    }

    #[test]
    fn parse_embedding_response() {
        let data = r#"{
            "data": [
                {"embedding": [0.1, 0.2, 0.3], "index": 0},
                {"embedding": [0.4, 0.5, 0.6], "index": 1}
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(parsed.data[1].embedding, vec![0.4, 0.5, 0.6]);
        assert_eq!(parsed.model, "text-embedding-3-small");
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 8);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transient() {
        let provider = OpenAiCompatProvider::new("dead", "http://127.0.0.1:9", "k");
        let err = provider
            .complete(ProviderRequest::new("m", "hello"))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "got {err:?}");
    }
}
