//! Provider chain: the default provider followed by configured fallbacks.
//!
//! A completion walks the chain in order and stops at the first provider that
//! returns non-blank text. Two rules shape what the generator sees:
//!
//! - A provider that rejects its credentials is benched for the rest of the
//!   process. A bad key does not fix itself between turns, and every turn
//!   issues up to four generation calls.
//! - When the whole chain fails, a transient failure anywhere in the chain
//!   wins over a permanent one, so the generator's bounded retry gets another
//!   pass at a backend that was only busy.
//!
//! Errors are re-labelled with the provider that produced them. Log lines
//! inherit the generator's `generate` span and so carry the call site.

use async_trait::async_trait;
use heartline_core::error::ProviderError;
use heartline_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct FallbackProvider {
    name: String,
    links: Vec<ChainLink>,
}

struct ChainLink {
    provider: Arc<dyn Provider>,
    timeout: Duration,
    /// Replaces the request's model; fallbacks rarely share the primary's model names.
    model: Option<String>,
    benched: AtomicBool,
}

impl ChainLink {
    fn label(&self) -> &str {
        self.provider.name()
    }

    fn is_benched(&self) -> bool {
        self.benched.load(Ordering::Relaxed)
    }

    fn request_for(&self, request: &ProviderRequest) -> ProviderRequest {
        let mut request = request.clone();
        if let Some(model) = &self.model {
            request.model = model.clone();
        }
        request
    }
}

impl FallbackProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
        }
    }

    /// Append a provider that receives the caller's model unchanged.
    pub fn add(self, provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        self.push(provider, timeout, None)
    }

    /// Append a provider that is always asked for `model`.
    pub fn add_with_model(
        self,
        provider: Arc<dyn Provider>,
        timeout: Duration,
        model: impl Into<String>,
    ) -> Self {
        self.push(provider, timeout, Some(model.into()))
    }

    fn push(mut self, provider: Arc<dyn Provider>, timeout: Duration, model: Option<String>) -> Self {
        self.links.push(ChainLink {
            provider,
            timeout,
            model,
            benched: AtomicBool::new(false),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Providers still taking requests, in chain order.
    pub fn active(&self) -> Vec<&str> {
        self.links
            .iter()
            .filter(|link| !link.is_benched())
            .map(ChainLink::label)
            .collect()
    }

    fn bench(&self, link: &ChainLink) {
        if !link.benched.swap(true, Ordering::Relaxed) {
            warn!(
                chain = %self.name,
                provider = %link.label(),
                "Credentials rejected, benching provider for this session"
            );
        }
    }

    fn exhausted(&self) -> ProviderError {
        if self.links.is_empty() {
            ProviderError::NotConfigured(format!("provider chain '{}' is empty", self.name))
        } else {
            ProviderError::NotConfigured(format!(
                "every provider in chain '{}' rejected its credentials",
                self.name
            ))
        }
    }
}

/// Prefix the provider name onto errors that carry a message.
fn attribute(provider: &str, error: ProviderError) -> ProviderError {
    match error {
        ProviderError::ApiError {
            status_code,
            message,
        } => ProviderError::ApiError {
            status_code,
            message: format!("{provider}: {message}"),
        },
        ProviderError::AuthenticationFailed(m) => {
            ProviderError::AuthenticationFailed(format!("{provider}: {m}"))
        }
        ProviderError::NotConfigured(m) => ProviderError::NotConfigured(format!("{provider}: {m}")),
        ProviderError::Timeout(m) => ProviderError::Timeout(format!("{provider}: {m}")),
        ProviderError::Network(m) => ProviderError::Network(format!("{provider}: {m}")),
        other => other,
    }
}

/// The error reported once every link has failed.
fn surfaced(mut failures: Vec<ProviderError>) -> Option<ProviderError> {
    let transient = failures.iter().rposition(ProviderError::is_transient);
    match transient {
        Some(i) => Some(failures.swap_remove(i)),
        None => failures.pop(),
    }
}

#[async_trait]
impl Provider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut failures = Vec::new();

        for (position, link) in self.links.iter().enumerate() {
            if link.is_benched() {
                debug!(provider = %link.label(), "Skipping benched provider");
                continue;
            }

            let outcome =
                tokio::time::timeout(link.timeout, link.provider.complete(link.request_for(&request)))
                    .await;

            let error = match outcome {
                Ok(Ok(response)) if !response.text.trim().is_empty() => {
                    if position > 0 {
                        info!(
                            chain = %self.name,
                            provider = %link.label(),
                            model = %response.model,
                            failed_before = failures.len(),
                            "Fallback provider answered"
                        );
                    }
                    return Ok(response);
                }
                Ok(Ok(_)) => ProviderError::EmptyResponse,
                Ok(Err(ProviderError::AuthenticationFailed(m))) => {
                    self.bench(link);
                    ProviderError::AuthenticationFailed(m)
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "no completion within {}s",
                    link.timeout.as_secs_f32()
                )),
            };

            warn!(
                chain = %self.name,
                provider = %link.label(),
                transient = error.is_transient(),
                error = %error,
                "Provider failed, moving down the chain"
            );
            failures.push(attribute(link.label(), error));
        }

        Err(surfaced(failures).unwrap_or_else(|| self.exhausted()))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let mut failures = Vec::new();

        for link in self.links.iter().filter(|link| !link.is_benched()) {
            match tokio::time::timeout(link.timeout, link.provider.embed(request.clone())).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    debug!(provider = %link.label(), error = %e, "No embeddings from provider");
                    failures.push(attribute(link.label(), e));
                }
                Err(_) => failures.push(ProviderError::Timeout(format!(
                    "{}: no embeddings within {}s",
                    link.label(),
                    link.timeout.as_secs_f32()
                ))),
            }
        }

        Err(surfaced(failures).unwrap_or_else(|| self.exhausted()))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        for link in self.links.iter().filter(|link| !link.is_benched()) {
            if let Ok(true) = link.provider.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ProviderGenerator;
    use heartline_core::generation::Generator;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes and records the model of every request.
    struct Backend {
        name: &'static str,
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        models: Mutex<Vec<String>>,
    }

    impl Backend {
        fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script.into()),
                models: Mutex::new(Vec::new()),
            })
        }

        fn replying(name: &'static str, text: &str) -> Arc<Self> {
            Self::new(name, vec![Ok(text.to_string()); 8])
        }

        fn failing(name: &'static str, error: ProviderError) -> Arc<Self> {
            Self::new(name, vec![Err(error); 8])
        }

        fn calls(&self) -> usize {
            self.models.lock().unwrap().len()
        }

        fn models(&self) -> Vec<String> {
            self.models.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for Backend {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.models.lock().unwrap().push(request.model.clone());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse));
            next.map(|text| ProviderResponse {
                text,
                usage: None,
                model: request.model,
            })
        }
    }

    struct Stalled;

    #[async_trait]
    impl Provider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::EmptyResponse)
        }
    }

    const SECS: Duration = Duration::from_secs(5);

    fn auth_error() -> ProviderError {
        ProviderError::AuthenticationFailed("invalid api key".into())
    }

    fn overloaded() -> ProviderError {
        ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest::new("primary-model", "Identify the main issue")
    }

    #[tokio::test]
    async fn primary_answer_skips_fallbacks() {
        let primary = Backend::replying("openrouter", "Work Burnout");
        let backup = Backend::replying("ollama", "unused");
        let chain = FallbackProvider::new("chain")
            .add(primary.clone(), SECS)
            .add(backup.clone(), SECS);

        let response = chain.complete(request()).await.unwrap();
        assert_eq!(response.text, "Work Burnout");
        assert_eq!(backup.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_credentials_bench_the_provider() {
        let primary = Backend::failing("openrouter", auth_error());
        let backup = Backend::replying("ollama", "I'm here for you.");
        let chain = FallbackProvider::new("chain")
            .add(primary.clone(), SECS)
            .add(backup.clone(), SECS);

        for _ in 0..3 {
            let response = chain.complete(request()).await.unwrap();
            assert_eq!(response.text, "I'm here for you.");
        }
        assert_eq!(primary.calls(), 1);
        assert_eq!(backup.calls(), 3);
        assert_eq!(chain.active(), vec!["ollama"]);
    }

    #[tokio::test]
    async fn all_credentials_rejected_reports_not_configured() {
        let chain = FallbackProvider::new("chain")
            .add(Backend::failing("openrouter", auth_error()), SECS)
            .add(Backend::failing("openai", auth_error()), SECS);

        let first = chain.complete(request()).await.unwrap_err();
        assert!(matches!(&first, ProviderError::AuthenticationFailed(m) if m.starts_with("openai:")));

        let second = chain.complete(request()).await.unwrap_err();
        assert!(matches!(second, ProviderError::NotConfigured(_)));
        assert!(chain.active().is_empty());
    }

    #[tokio::test]
    async fn blank_completion_moves_down_the_chain() {
        let primary = Backend::replying("openrouter", "  \n ");
        let backup = Backend::replying("ollama", "That sounds heavy.");
        let chain = FallbackProvider::new("chain")
            .add(primary.clone(), SECS)
            .add(backup, SECS);

        let response = chain.complete(request()).await.unwrap();
        assert_eq!(response.text, "That sounds heavy.");
        // Blank text is not a credentials problem.
        assert_eq!(chain.active(), vec!["openrouter", "ollama"]);
    }

    #[tokio::test]
    async fn transient_failure_is_surfaced_over_permanent() {
        let chain = FallbackProvider::new("chain")
            .add(Backend::failing("openrouter", overloaded()), SECS)
            .add(Backend::failing("ollama", auth_error()), SECS);

        let err = chain.complete(request()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("openrouter: overloaded"));
    }

    #[tokio::test]
    async fn permanent_failures_surface_the_last() {
        let chain = FallbackProvider::new("chain")
            .add(
                Backend::failing("openrouter", ProviderError::NotConfigured("no model".into())),
                SECS,
            )
            .add(Backend::replying("ollama", ""), SECS);

        let err = chain.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn fallback_uses_its_own_model() {
        let primary = Backend::failing("openrouter", overloaded());
        let backup = Backend::replying("ollama", "ok");
        let chain = FallbackProvider::new("chain")
            .add(primary.clone(), SECS)
            .add_with_model(backup.clone(), SECS, "llama3.1");

        let response = chain.complete(request()).await.unwrap();
        assert_eq!(response.model, "llama3.1");
        assert_eq!(primary.models(), vec!["primary-model"]);
        assert_eq!(backup.models(), vec!["llama3.1"]);
    }

    #[tokio::test]
    async fn stalled_provider_times_out_to_next() {
        let chain = FallbackProvider::new("chain")
            .add(Arc::new(Stalled), Duration::from_millis(20))
            .add(Backend::replying("ollama", "still here"), SECS);

        let response = chain.complete(request()).await.unwrap();
        assert_eq!(response.text, "still here");
    }

    #[tokio::test]
    async fn empty_chain_is_not_configured() {
        let chain = FallbackProvider::new("chain");
        assert!(chain.is_empty());
        let err = chain.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(m) if m.contains("empty")));
    }

    #[tokio::test]
    async fn embeddings_come_from_first_capable_provider() {
        // Backend keeps the trait's default embed, which is unsupported.
        let chain = FallbackProvider::new("chain").add(Backend::replying("openrouter", "x"), SECS);
        let err = chain
            .embed(EmbeddingRequest {
                model: "text-embedding-3-small".into(),
                inputs: vec!["hello".into()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("openrouter"));
    }

    #[tokio::test]
    async fn generator_retries_the_whole_chain_on_transient_failure() {
        let primary = Backend::new(
            "openrouter",
            vec![Err(overloaded()), Err(overloaded()), Ok("Grief And Loss".into())],
        );
        let backup = Backend::new("ollama", vec![Err(ProviderError::Network("refused".into())); 2]);
        let chain: Arc<dyn Provider> = Arc::new(
            FallbackProvider::new("chain")
                .add(primary.clone(), SECS)
                .add(backup.clone(), SECS),
        );

        let text = ProviderGenerator::new(chain, "m")
            .with_backoff(Duration::ZERO)
            .with_max_retries(2)
            .generate("issue", "p")
            .await
            .unwrap();
        assert_eq!(text, "Grief And Loss");
        assert_eq!(primary.calls(), 3);
        assert_eq!(backup.calls(), 2);
    }

    #[tokio::test]
    async fn generator_does_not_retry_a_chain_of_rejected_keys() {
        let primary = Backend::failing("openrouter", auth_error());
        let chain: Arc<dyn Provider> =
            Arc::new(FallbackProvider::new("chain").add(primary.clone(), SECS));

        let err = ProviderGenerator::new(chain, "m")
            .with_backoff(Duration::ZERO)
            .generate("summary", "p")
            .await
            .unwrap_err();
        assert_eq!(err.call_site, "summary");
        assert_eq!(err.attempts, 1);
        assert!(err.to_string().contains("openrouter: invalid api key"));
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn health_ignores_benched_providers() {
        let chain = FallbackProvider::new("chain").add(Backend::failing("openrouter", auth_error()), SECS);
        assert!(chain.health_check().await.unwrap());
        let _ = chain.complete(request()).await;
        assert!(!chain.health_check().await.unwrap());
    }
}
