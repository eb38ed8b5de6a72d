//! `heartline index` — Inspect and populate the exemplar index.

use std::path::Path;

use heartline_config::AppConfig;
use heartline_core::exemplar::{Embedder, ExemplarRecord, ExemplarStore};
use tracing::{info, warn};

use crate::wiring::{self, OpenMode};

/// Records per insert batch unless `--batch-size` says otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Outcome of reading an import file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedImport {
    pub records: Vec<ExemplarRecord>,
    /// Lines that were not a JSON exemplar object
    pub malformed: usize,
    /// Objects missing context, response, or emotion
    pub incomplete: usize,
}

/// Parse JSONL exemplars, one `{context, response, emotion}` object per line.
/// Blank lines are ignored; bad and incomplete lines are counted and skipped.
pub fn parse_jsonl(content: &str) -> ParsedImport {
    let mut parsed = ParsedImport::default();

    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ExemplarRecord>(line) {
            Ok(record) if record.is_complete() => parsed.records.push(record),
            Ok(_) => parsed.incomplete += 1,
            Err(e) => {
                warn!(line = n + 1, error = %e, "skipping malformed exemplar line");
                parsed.malformed += 1;
            }
        }
    }

    parsed
}

pub async fn status() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = heartline_providers::build_from_config(&config);
    let embedder = wiring::build_embedder(&config, &router)?;
    let embedder_name = embedder.name().to_string();

    println!("Exemplar Index");
    println!("==============");
    println!("  Backend:     {}", config.index.backend);
    if matches!(config.index.backend.as_str(), "sqlite" | "file") {
        println!("  Path:        {}", config.index.resolved_path().display());
    }
    println!("  Collection:  {}", config.index.collection);
    println!("  Embedder:    {embedder_name}");
    println!("  Top-K:       {}", config.index.top_k);

    match wiring::open_store(&config, embedder, OpenMode::Existing).await {
        Ok(store) => match store.count().await {
            Ok(n) => println!("  Exemplars:   {n}"),
            Err(e) => println!("  Exemplars:   unavailable ({e})"),
        },
        Err(e) => {
            println!("  Exemplars:   unavailable ({e})");
            println!();
            println!("  Populate it with `heartline index import <file.jsonl>`.");
        }
    }

    Ok(())
}

pub async fn import(
    file: &Path,
    batch_size: usize,
    clear: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;

    let parsed = parse_jsonl(&content);
    if parsed.records.is_empty() {
        return Err(format!("No complete exemplars found in {}", file.display()).into());
    }

    let router = heartline_providers::build_from_config(&config);
    let embedder = wiring::build_embedder(&config, &router)?;
    let store = wiring::open_store(&config, embedder, OpenMode::CreateIfMissing).await?;

    if clear {
        store.clear().await?;
        println!("Cleared collection '{}'.", store.collection());
    }

    let inserted = insert_in_batches(store.as_ref(), parsed.records, batch_size).await?;

    println!(
        "Imported {inserted} exemplars into '{}' ({} malformed, {} incomplete skipped).",
        store.collection(),
        parsed.malformed,
        parsed.incomplete
    );
    if let Ok(total) = store.count().await {
        println!("Collection now holds {total} exemplars.");
    }

    Ok(())
}

/// Insert `records` in batches of `batch_size`, returning how many were
/// stored.
pub async fn insert_in_batches(
    store: &dyn ExemplarStore,
    records: Vec<ExemplarRecord>,
    batch_size: usize,
) -> Result<usize, heartline_core::IndexError> {
    let batch_size = batch_size.max(1);
    let total = records.len();
    let mut inserted = 0;

    for (i, batch) in records.chunks(batch_size).enumerate() {
        let ids = store.insert_batch(batch.to_vec()).await?;
        inserted += ids.len();
        info!(batch = i + 1, inserted, total, "exemplar batch stored");
    }

    Ok(inserted)
}
