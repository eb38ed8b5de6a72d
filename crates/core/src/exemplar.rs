//! Exemplar records and the vector-index capability traits.
//!
//! Exemplars are `(context, response, emotion)` triples from an empathetic
//! dialogue corpus. They are written once by ingestion, then only read:
//! the nearest neighbor supplies the emotion label for a turn and the top-K
//! neighbors become few-shot grounding in the response prompt.

use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored `(context, response, emotion)` triple. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemplarRecord {
    /// The situation the speaker described
    pub context: String,

    /// The empathetic reply given in the corpus
    pub response: String,

    /// The corpus emotion label (open vocabulary)
    pub emotion: String,
}

impl ExemplarRecord {
    pub fn new(
        context: impl Into<String>,
        response: impl Into<String>,
        emotion: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            response: response.into(),
            emotion: emotion.into(),
        }
    }

    /// Whether every field carries text. Incomplete rows are never indexed.
    pub fn is_complete(&self) -> bool {
        !self.context.trim().is_empty()
            && !self.response.trim().is_empty()
            && !self.emotion.trim().is_empty()
    }

    /// The document form: the text that gets embedded and the text injected
    /// into the response prompt as RAG context.
    pub fn document(&self) -> String {
        format!(
            "Context: {} | Response: {} | Emotion: {}",
            self.context, self.response, self.emotion
        )
    }
}

/// An exemplar returned by a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredExemplar {
    /// Identifier assigned at insert time
    pub id: String,

    /// The stored record
    pub record: ExemplarRecord,

    /// Cosine similarity to the query (higher is closer)
    pub score: f32,
}

/// Nearest-neighbor lookup over the exemplar index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The backend name (e.g., "sqlite", "file", "in_memory", "none").
    fn name(&self) -> &str;

    /// Return at most `k` exemplars, nearest first.
    ///
    /// Fails with [`IndexError::Unavailable`] when the collection cannot be
    /// opened; callers treat any error as "no exemplars".
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredExemplar>, IndexError>;
}

/// Write side of an exemplar collection, used by ingestion and admin tooling.
#[async_trait]
pub trait ExemplarStore: Retriever {
    /// The collection this store reads and writes.
    fn collection(&self) -> &str;

    /// Insert a batch of records under auto-incrementing string ids
    /// (`"0"`, `"1"`, ...). Incomplete records are skipped.
    /// Returns the ids assigned to the records that were stored.
    async fn insert_batch(&self, records: Vec<ExemplarRecord>) -> Result<Vec<String>, IndexError>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize, IndexError>;

    /// Remove every record from the collection.
    async fn clear(&self) -> Result<(), IndexError>;
}

/// Text → vector, used by the index backends at insert and query time.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// A label for logs (e.g., "hashing", "openrouter/text-embedding-3-small").
    fn name(&self) -> &str;

    /// Embed every text, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError>;
}
