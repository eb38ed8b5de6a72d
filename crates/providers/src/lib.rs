//! LLM Provider implementations for Heartline.
//!
//! All providers implement the `heartline_core::Provider` trait.
//! The router selects the correct provider based on configuration; the
//! generator and embedder adapt a provider to the agent- and index-facing
//! traits.

pub mod embedder;
pub mod fallback;
pub mod generator;
pub mod openai_compat;
pub mod router;

pub use embedder::ProviderEmbedder;
pub use fallback::FallbackProvider;
pub use generator::ProviderGenerator;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
