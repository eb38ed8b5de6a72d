//! Builds the agent's service handles from configuration.

use std::sync::Arc;
use std::time::Duration;

use heartline_config::AppConfig;
use heartline_core::error::IndexError;
use heartline_core::exemplar::{Embedder, ExemplarStore};
use heartline_core::generation::Generator;
use heartline_memory::{FileIndex, HashingEmbedder, InMemoryIndex, NoopIndex};
use heartline_providers::{ProviderEmbedder, ProviderGenerator, ProviderRouter};
use tracing::{debug, warn};

/// Whether a missing collection should be created or reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Chat and status: the collection must already exist.
    Existing,
    /// Import: create the database/file and collection on demand.
    CreateIfMissing,
}

pub fn build_generator(
    config: &AppConfig,
    router: &ProviderRouter,
) -> Result<Arc<dyn Generator>, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(config.runtime.generation_timeout_secs);
    let provider = router
        .chain(&config.fallback_providers, timeout)
        .ok_or("No default provider configured")?;

    debug!(provider = provider.name(), model = %config.default_model, "generator ready");

    Ok(Arc::new(
        ProviderGenerator::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_timeout(timeout)
            .with_max_retries(config.runtime.max_retries),
    ))
}

/// `"hashing"` is offline; anything else names a registered provider whose
/// `/embeddings` endpoint is used.
pub fn build_embedder(
    config: &AppConfig,
    router: &ProviderRouter,
) -> Result<Arc<dyn Embedder>, Box<dyn std::error::Error>> {
    match config.index.embedding_provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbedder::new(config.index.dimensions))),
        name => {
            let provider = router.get(name).ok_or_else(|| {
                format!("embedding provider '{name}' is not configured; add a [providers.{name}] section")
            })?;
            Ok(Arc::new(ProviderEmbedder::new(provider, &config.index.embedding_model)))
        }
    }
}

/// Open the configured exemplar index.
pub async fn open_store(
    config: &AppConfig,
    embedder: Arc<dyn Embedder>,
    mode: OpenMode,
) -> Result<Arc<dyn ExemplarStore>, IndexError> {
    let collection = config.index.collection.as_str();
    let path = config.index.resolved_path();

    match config.index.backend.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use heartline_memory::SqliteIndex;

            let url = format!("sqlite://{}", path.display());
            let index = match mode {
                OpenMode::Existing => SqliteIndex::open(&url, collection, embedder).await?,
                OpenMode::CreateIfMissing => {
                    ensure_parent(&path)?;
                    SqliteIndex::create(&url, collection, embedder).await?
                }
            };
            Ok(Arc::new(index))
        }
        "file" => {
            let index = match mode {
                OpenMode::Existing => FileIndex::open(&path, collection, embedder)?,
                OpenMode::CreateIfMissing => {
                    ensure_parent(&path)?;
                    FileIndex::create(&path, collection, embedder)
                }
            };
            Ok(Arc::new(index))
        }
        "memory" => Ok(Arc::new(InMemoryIndex::new(collection, embedder))),
        other => Ok(Arc::new(NoopIndex::new(format!(
            "index backend '{other}' serves no exemplars"
        )))),
    }
}

/// Open the index for chatting. A missing or broken index degrades to one
/// that reports itself unavailable, so the agent falls back per turn.
pub async fn open_for_chat(config: &AppConfig, embedder: Arc<dyn Embedder>) -> Arc<dyn ExemplarStore> {
    match open_store(config, embedder, OpenMode::Existing).await {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "exemplar index unavailable, chatting without retrieval");
            Arc::new(NoopIndex::new(e.to_string()))
        }
    }
}

fn ensure_parent(path: &std::path::Path) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| IndexError::Storage(format!("cannot create {}: {e}", parent.display())))?;
    }
    Ok(())
}
