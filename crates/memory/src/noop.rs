//! No-op index — used when no exemplar collection is configured or the
//! configured one could not be opened.

use async_trait::async_trait;
use heartline_core::error::IndexError;
use heartline_core::exemplar::{ExemplarRecord, ExemplarStore, Retriever, ScoredExemplar};

/// An index that has no collection. Every query reports `Unavailable`.
pub struct NoopIndex {
    reason: String,
}

impl NoopIndex {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for NoopIndex {
    fn default() -> Self {
        Self::new("no exemplar index configured")
    }
}

#[async_trait]
impl Retriever for NoopIndex {
    fn name(&self) -> &str {
        "none"
    }

    async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<ScoredExemplar>, IndexError> {
        Err(IndexError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl ExemplarStore for NoopIndex {
    fn collection(&self) -> &str {
        ""
    }

    async fn insert_batch(&self, _records: Vec<ExemplarRecord>) -> Result<Vec<String>, IndexError> {
        Err(IndexError::Unavailable(self.reason.clone()))
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Err(IndexError::Unavailable(self.reason.clone()))
    }

    async fn clear(&self) -> Result<(), IndexError> {
        Ok(())
    }
}
