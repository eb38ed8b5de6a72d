//! Error types for the Heartline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! None of these errors ever escape a turn: the agent maps every external
//! failure to a documented fallback value. They exist so that the fallback
//! decision can be logged with the precise cause.

use thiserror::Error;

/// The top-level error type for Heartline operations outside a turn
/// (index administration, provider health checks, wiring).
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Vector index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) | Self::EmptyResponse => false,
        }
    }
}

/// A failed `generate(prompt)` call, tagged with the call site that issued it.
#[derive(Debug, Clone, Error)]
#[error("generation for {call_site} failed after {attempts} attempt(s): {source}")]
pub struct GenerationError {
    /// Which turn step issued the call ("issue", "summary", "response", "activities").
    pub call_site: String,
    /// How many attempts were made before giving up.
    pub attempts: u32,
    #[source]
    pub source: ProviderError,
}

impl GenerationError {
    pub fn new(call_site: impl Into<String>, attempts: u32, source: ProviderError) -> Self {
        Self {
            call_site: call_site.into(),
            attempts,
            source,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// The backing collection could not be opened or reached.
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    #[error("Index query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
