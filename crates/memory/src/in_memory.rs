//! In-memory index — useful for testing and ephemeral sessions.

use crate::vector::{self, StoredExemplar};
use async_trait::async_trait;
use heartline_core::error::IndexError;
use heartline_core::exemplar::{Embedder, ExemplarRecord, ExemplarStore, Retriever, ScoredExemplar};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An exemplar index held in a Vec. Nothing survives the process.
pub struct InMemoryIndex {
    collection: String,
    embedder: Arc<dyn Embedder>,
    entries: Arc<RwLock<Vec<StoredExemplar>>>,
}

impl InMemoryIndex {
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            collection: collection.into(),
            embedder,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Retriever for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredExemplar>, IndexError> {
        let query_embedding = vector::embed_query(self.embedder.as_ref(), query).await?;
        let entries = self.entries.read().await;
        Ok(vector::nearest(entries.iter(), &query_embedding, k))
    }
}

#[async_trait]
impl ExemplarStore for InMemoryIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn insert_batch(&self, records: Vec<ExemplarRecord>) -> Result<Vec<String>, IndexError> {
        // Hold the write lock across embedding so concurrent batches get distinct ids
        let mut entries = self.entries.write().await;
        let prepared = vector::prepare_batch(self.embedder.as_ref(), records, entries.len()).await?;
        let ids = prepared.iter().map(|e| e.id.clone()).collect();
        entries.extend(prepared);
        Ok(ids)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), IndexError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
