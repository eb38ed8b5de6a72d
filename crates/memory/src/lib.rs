//! Exemplar index implementations for Heartline.
//!
//! Every backend implements `heartline_core::ExemplarStore` (and therefore
//! `Retriever`). Records are embedded in their document form at insert time
//! and ranked by cosine similarity at query time.

pub mod file_backend;
pub mod hashing;
pub mod in_memory;
pub mod noop;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file_backend::FileIndex;
pub use hashing::HashingEmbedder;
pub use in_memory::InMemoryIndex;
pub use noop::NoopIndex;
pub use vector::{StoredExemplar, cosine_similarity, nearest};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIndex;
