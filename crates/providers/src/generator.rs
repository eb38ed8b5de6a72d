//! Bounded-retry generator over a provider.
//!
//! Every agent call site goes through [`ProviderGenerator::generate`]: one
//! request per attempt, each attempt capped by a timeout, transient failures
//! retried with exponential backoff up to `max_retries` extra attempts.

use async_trait::async_trait;
use heartline_core::error::{GenerationError, ProviderError};
use heartline_core::generation::Generator;
use heartline_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info_span, warn};

pub struct ProviderGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay before the first retry; doubles on each further retry.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn attempt(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) if response.text.trim().is_empty() => Err(ProviderError::EmptyResponse),
            Ok(Ok(response)) => Ok(response.text),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout(format!(
                "no completion within {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

#[async_trait]
impl Generator for ProviderGenerator {
    async fn generate(&self, call_site: &str, prompt: &str) -> Result<String, GenerationError> {
        self.with_retries(call_site, prompt)
            .instrument(info_span!("generate", call_site))
            .await
    }
}

impl ProviderGenerator {
    async fn with_retries(&self, call_site: &str, prompt: &str) -> Result<String, GenerationError> {
        let max_attempts = self.max_retries + 1;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(
                call_site,
                attempt = attempts,
                provider = %self.provider.name(),
                model = %self.model,
                "Generating"
            );

            match self.attempt(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempts < max_attempts => {
                    let delay = self.backoff * 2u32.saturating_pow(attempts - 1);
                    warn!(
                        call_site,
                        attempt = attempts,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Transient generation failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(GenerationError::new(call_site, attempts, e)),
            }
        }
    }
}
