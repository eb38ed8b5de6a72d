//! File-based index — persistent JSON-lines storage.
//!
//! Each line is a JSON-encoded [`StoredExemplar`] (id, record fields, and
//! embedding). The file is loaded into memory on open; inserts append to it.
//! Human-inspectable and portable, with no database dependency.

use crate::vector::{self, StoredExemplar};
use async_trait::async_trait;
use heartline_core::error::IndexError;
use heartline_core::exemplar::{Embedder, ExemplarRecord, ExemplarStore, Retriever, ScoredExemplar};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A JSONL-backed exemplar collection.
pub struct FileIndex {
    path: PathBuf,
    collection: String,
    embedder: Arc<dyn Embedder>,
    entries: Arc<RwLock<Vec<StoredExemplar>>>,
}

impl FileIndex {
    /// Open an existing collection file.
    ///
    /// Fails with `Unavailable` if the file does not exist.
    pub fn open(
        path: impl Into<PathBuf>,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        let path = path.into();
        if !path.exists() {
            return Err(IndexError::Unavailable(format!(
                "no exemplar file at {}",
                path.display()
            )));
        }
        Ok(Self::create(path, collection, embedder))
    }

    /// Open the collection file, starting empty if it does not exist yet.
    /// The file is created on first insert.
    pub fn create(
        path: impl Into<PathBuf>,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let path = path.into();
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "File exemplar index loaded");
        Self {
            path,
            collection: collection.into(),
            embedder,
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Vec<StoredExemplar> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoredExemplar>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted exemplar line");
                    None
                }
            })
            .collect()
    }

    fn append(&self, batch: &[StoredExemplar]) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                IndexError::Storage(format!("Failed to create index directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for entry in batch {
            let line = serde_json::to_string(entry)
                .map_err(|e| IndexError::Storage(format!("Failed to serialize exemplar: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| IndexError::Storage(format!("Failed to open exemplar file: {e}")))?;
        file.write_all(content.as_bytes())
            .map_err(|e| IndexError::Storage(format!("Failed to write exemplar file: {e}")))?;
        Ok(())
    }

    fn next_id(entries: &[StoredExemplar]) -> usize {
        entries
            .iter()
            .filter_map(|e| e.id.parse::<usize>().ok())
            .max()
            .map_or(0, |max| max + 1)
    }
}

#[async_trait]
impl Retriever for FileIndex {
    fn name(&self) -> &str {
        "file"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredExemplar>, IndexError> {
        let query_embedding = vector::embed_query(self.embedder.as_ref(), query).await?;
        let entries = self.entries.read().await;
        Ok(vector::nearest(entries.iter(), &query_embedding, k))
    }
}

#[async_trait]
impl ExemplarStore for FileIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn insert_batch(&self, records: Vec<ExemplarRecord>) -> Result<Vec<String>, IndexError> {
        let mut entries = self.entries.write().await;
        let first_id = Self::next_id(&entries);
        let prepared = vector::prepare_batch(self.embedder.as_ref(), records, first_id).await?;
        if prepared.is_empty() {
            return Ok(Vec::new());
        }

        self.append(&prepared)?;
        let ids = prepared.iter().map(|e| e.id.clone()).collect();
        entries.extend(prepared);
        Ok(ids)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), IndexError> {
        let mut entries = self.entries.write().await;
        if self.path.exists() {
            std::fs::write(&self.path, "")
                .map_err(|e| IndexError::Storage(format!("Failed to truncate exemplar file: {e}")))?;
        }
        entries.clear();
        Ok(())
    }
}
