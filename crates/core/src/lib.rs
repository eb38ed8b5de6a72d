//! # Heartline Core
//!
//! Domain types, capability traits, and error definitions for the Heartline
//! empathetic agent. This crate has **no I/O of its own**. It defines the
//! turn log, the per-session state, the exemplar records served by the
//! vector index, and the narrow traits every other crate implements against.
//!
//! ## Capability seams
//!
//! - [`Provider`] — wire-level LLM backend (chat completion + embeddings)
//! - [`Generator`] — `generate(prompt) -> text`, the only call the agent makes
//! - [`Retriever`] — `retrieve(query, k) -> exemplars` over the vector index
//! - [`Embedder`] — text → vector, used by the index backends
//!
//! Keeping the agent behind `Generator`/`Retriever` lets every turn be
//! exercised with deterministic fakes.

pub mod error;
pub mod exemplar;
pub mod generation;
pub mod message;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, IndexError, ProviderError, Result};
pub use exemplar::{Embedder, ExemplarRecord, ExemplarStore, Retriever, ScoredExemplar};
pub use generation::Generator;
pub use message::{Role, Turn};
pub use provider::{EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::{ContextBuffer, ContextEntry, SessionState};
