//! Vector similarity and ranking utilities.
//!
//! Pure-Rust cosine similarity plus the exact nearest-neighbor scan every
//! backend shares: exemplar corpora are small enough that a linear pass
//! over stored embeddings is the whole query plan.

use heartline_core::error::IndexError;
use heartline_core::exemplar::{Embedder, ExemplarRecord, ScoredExemplar};
use serde::{Deserialize, Serialize};

/// An exemplar as persisted by a backend: id, record, and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredExemplar {
    pub id: String,
    #[serde(flatten)]
    pub record: ExemplarRecord,
    pub embedding: Vec<f32>,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank stored exemplars by cosine similarity to a query embedding.
///
/// Returns at most `limit` results, nearest first. Ties keep insertion order.
pub fn nearest<'a, I>(entries: I, query_embedding: &[f32], limit: usize) -> Vec<ScoredExemplar>
where
    I: IntoIterator<Item = &'a StoredExemplar>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredExemplar> = entries
        .into_iter()
        .map(|entry| ScoredExemplar {
            id: entry.id.clone(),
            record: entry.record.clone(),
            score: cosine_similarity(&entry.embedding, query_embedding),
        })
        .collect();

    // sort_by is stable, so equal scores stay in insertion order
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Embed a single query string.
pub async fn embed_query(embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>, IndexError> {
    embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| IndexError::EmbeddingFailed("embedder returned no vectors".into()))
}

/// Drop incomplete records, embed the document form of the rest, and assign
/// sequential ids starting at `first_id`.
pub async fn prepare_batch(
    embedder: &dyn Embedder,
    records: Vec<ExemplarRecord>,
    first_id: usize,
) -> Result<Vec<StoredExemplar>, IndexError> {
    let total = records.len();
    let complete: Vec<ExemplarRecord> = records.into_iter().filter(|r| r.is_complete()).collect();
    if complete.len() < total {
        tracing::debug!(
            skipped = total - complete.len(),
            "Dropping incomplete exemplar records"
        );
    }
    if complete.is_empty() {
        return Ok(Vec::new());
    }

    let documents: Vec<String> = complete.iter().map(ExemplarRecord::document).collect();
    let embeddings = embedder.embed(&documents).await?;
    if embeddings.len() != complete.len() {
        return Err(IndexError::EmbeddingFailed(format!(
            "expected {} embeddings, got {}",
            complete.len(),
            embeddings.len()
        )));
    }

    Ok(complete
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (record, embedding))| StoredExemplar {
            id: (first_id + i).to_string(),
            record,
            embedding,
        })
        .collect())
}
