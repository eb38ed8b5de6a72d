//! Generator trait — the single text-completion capability the agent uses.

use crate::error::GenerationError;
use async_trait::async_trait;

/// `generate(prompt) -> text`.
///
/// Implementations own timeouts and retries. `call_site` names the turn step
/// issuing the call ("issue", "summary", "response", "activities") so
/// failures can be attributed in logs.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, call_site: &str, prompt: &str) -> Result<String, GenerationError>;
}
