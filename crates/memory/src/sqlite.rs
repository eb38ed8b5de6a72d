//! SQLite exemplar index.
//!
//! One table per collection, named `exemplars_<collection>`. Each row holds
//! the sequential string id, the record fields, the document form, and the
//! embedding as a little-endian f32 blob. Queries load the embeddings and
//! rank them with an exact cosine scan.

use crate::vector::{self, StoredExemplar};
use async_trait::async_trait;
use heartline_core::error::IndexError;
use heartline_core::exemplar::{Embedder, ExemplarRecord, ExemplarStore, Retriever, ScoredExemplar};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A persistent exemplar collection stored in SQLite.
pub struct SqliteIndex {
    pool: SqlitePool,
    collection: String,
    table: String,
    embedder: Arc<dyn Embedder>,
    // Serializes id assignment across concurrent insert batches
    write_lock: Mutex<()>,
}

impl SqliteIndex {
    /// Open an existing collection.
    ///
    /// Fails with `Unavailable` if the database file or the collection's
    /// table does not exist.
    pub async fn open(
        path: &str,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        let pool = Self::connect(path, false)
            .await
            .map_err(|e| IndexError::Unavailable(format!("cannot open {path}: {e}")))?;
        let index = Self::with_pool(pool, collection, embedder);

        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(&index.table)
            .fetch_optional(&index.pool)
            .await
            .map_err(|e| IndexError::Unavailable(format!("cannot inspect {path}: {e}")))?;

        if exists.is_none() {
            return Err(IndexError::Unavailable(format!(
                "collection '{collection}' not found in {path}"
            )));
        }

        info!(path, collection, "SQLite exemplar index opened");
        Ok(index)
    }

    /// Open the collection, creating the database file and table if needed.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn create(
        path: &str,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        let pool = Self::connect(path, true)
            .await
            .map_err(|e| IndexError::Storage(format!("Failed to open SQLite: {e}")))?;
        let index = Self::with_pool(pool, collection, embedder);
        index.run_migrations().await?;
        info!(path, collection, "SQLite exemplar index initialized");
        Ok(index)
    }

    async fn connect(path: &str, create: bool) -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
    }

    fn with_pool(pool: SqlitePool, collection: &str, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            pool,
            collection: collection.to_string(),
            table: table_name(collection),
            embedder,
            write_lock: Mutex::new(()),
        }
    }

    async fn run_migrations(&self) -> Result<(), IndexError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                iid        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT UNIQUE NOT NULL,
                context    TEXT NOT NULL,
                response   TEXT NOT NULL,
                emotion    TEXT NOT NULL,
                document   TEXT NOT NULL,
                embedding  BLOB NOT NULL
            )
            "#,
            table = self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| IndexError::MigrationFailed(format!("{} table: {e}", self.table)))?;

        debug!(table = %self.table, "SQLite migrations complete");
        Ok(())
    }

    fn row_to_stored(row: &sqlx::sqlite::SqliteRow) -> Result<StoredExemplar, IndexError> {
        let column = |name: &str, e: sqlx::Error| IndexError::QueryFailed(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let context: String = row.try_get("context").map_err(|e| column("context", e))?;
        let response: String = row.try_get("response").map_err(|e| column("response", e))?;
        let emotion: String = row.try_get("emotion").map_err(|e| column("emotion", e))?;
        let blob: Vec<u8> = row.try_get("embedding").map_err(|e| column("embedding", e))?;

        Ok(StoredExemplar {
            id,
            record: ExemplarRecord {
                context,
                response,
                emotion,
            },
            embedding: blob_to_embedding(&blob),
        })
    }

    async fn next_id(&self) -> Result<usize, IndexError> {
        let sql = format!(
            "SELECT COALESCE(MAX(CAST(id AS INTEGER)) + 1, 0) AS next FROM {}",
            self.table
        );
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| IndexError::QueryFailed(format!("next id: {e}")))?;
        let next: i64 = row
            .try_get("next")
            .map_err(|e| IndexError::QueryFailed(format!("next column: {e}")))?;
        Ok(next.max(0) as usize)
    }
}

/// Collection names map to `exemplars_<name>` with anything outside
/// `[A-Za-z0-9_]` replaced by `_`.
fn table_name(collection: &str) -> String {
    let clean: String = collection
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("exemplars_{clean}")
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[async_trait]
impl Retriever for SqliteIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredExemplar>, IndexError> {
        let query_embedding = vector::embed_query(self.embedder.as_ref(), query).await?;

        let sql = format!(
            "SELECT id, context, response, emotion, embedding FROM {} ORDER BY iid",
            self.table
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IndexError::QueryFailed(format!("Vector scan: {e}")))?;

        let entries = rows
            .iter()
            .map(Self::row_to_stored)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(collection = %self.collection, scanned = entries.len(), k, "SQLite similarity query");
        Ok(vector::nearest(entries.iter(), &query_embedding, k))
    }
}

#[async_trait]
impl ExemplarStore for SqliteIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn insert_batch(&self, records: Vec<ExemplarRecord>) -> Result<Vec<String>, IndexError> {
        let _guard = self.write_lock.lock().await;
        let first_id = self.next_id().await?;
        let prepared = vector::prepare_batch(self.embedder.as_ref(), records, first_id).await?;
        if prepared.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "INSERT INTO {} (id, context, response, emotion, document, embedding) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IndexError::Storage(format!("BEGIN failed: {e}")))?;

        for entry in &prepared {
            sqlx::query(&sql)
                .bind(&entry.id)
                .bind(&entry.record.context)
                .bind(&entry.record.response)
                .bind(&entry.record.emotion)
                .bind(entry.record.document())
                .bind(embedding_to_blob(&entry.embedding))
                .execute(&mut *tx)
                .await
                .map_err(|e| IndexError::Storage(format!("INSERT failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| IndexError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(collection = %self.collection, inserted = prepared.len(), "Stored exemplar batch");
        Ok(prepared.into_iter().map(|e| e.id).collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let sql = format!("SELECT COUNT(*) AS cnt FROM {}", self.table);
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| IndexError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| IndexError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }

    async fn clear(&self) -> Result<(), IndexError> {
        let sql = format!("DELETE FROM {}", self.table);
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| IndexError::Storage(format!("CLEAR failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(256))
    }

    fn db_path(dir: &tempfile::TempDir) -> String {
        format!("sqlite://{}", dir.path().join("exemplars.db").display())
    }

    fn corpus() -> Vec<ExemplarRecord> {
        vec![
            ExemplarRecord::new(
                "My grandmother passed away last night",
                "I'm so sorry. Were you close with her?",
                "devastated",
            ),
            ExemplarRecord::new(
                "I finally finished my marathon",
                "That's incredible, all that training paid off!",
                "proud",
            ),
            ExemplarRecord::new(
                "My roommate keeps eating my food",
                "That sounds really annoying. Have you talked to them?",
                "annoyed",
            ),
        ]
    }

    #[test]
    fn table_names_are_sanitized() {
        assert_eq!(table_name("empathetic_data"), "exemplars_empathetic_data");
        assert_eq!(table_name("my-data; DROP"), "exemplars_my_data__DROP");
    }

    #[test]
    fn blob_roundtrip_preserves_values() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&v)), v);
    }

    #[tokio::test]
    async fn in_memory_database_works() {
        let idx = SqliteIndex::create("sqlite::memory:", "empathetic_data", embedder())
            .await
            .unwrap();
        idx.insert_batch(corpus()).await.unwrap();
        assert_eq!(idx.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn insert_and_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let idx = SqliteIndex::create(&db_path(&dir), "empathetic_data", embedder())
            .await
            .unwrap();

        let ids = idx.insert_batch(corpus()).await.unwrap();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(idx.count().await.unwrap(), 3);

        let top = idx
            .retrieve("my roommate ate my food again", 1)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].record.emotion, "annoyed");
        assert_eq!(top[0].id, "2");
    }

    #[tokio::test]
    async fn ids_continue_across_batches_and_skip_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let idx = SqliteIndex::create(&db_path(&dir), "empathetic_data", embedder())
            .await
            .unwrap();

        idx.insert_batch(corpus()).await.unwrap();
        let ids = idx
            .insert_batch(vec![
                ExemplarRecord::new("", "missing context", "sad"),
                ExemplarRecord::new("New job", "Congrats!", "excited"),
            ])
            .await
            .unwrap();
        assert_eq!(ids, vec!["3"]);
        assert_eq!(idx.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn open_existing_collection_after_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        {
            let idx = SqliteIndex::create(&path, "empathetic_data", embedder())
                .await
                .unwrap();
            idx.insert_batch(corpus()).await.unwrap();
        }

        let idx = SqliteIndex::open(&path, "empathetic_data", embedder())
            .await
            .unwrap();
        assert_eq!(idx.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn open_missing_collection_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        SqliteIndex::create(&path, "other", embedder()).await.unwrap();

        let err = SqliteIndex::open(&path, "empathetic_data", embedder())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[tokio::test]
    async fn open_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteIndex::open(&db_path(&dir), "empathetic_data", embedder())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        let a = SqliteIndex::create(&path, "a", embedder()).await.unwrap();
        let b = SqliteIndex::create(&path, "b", embedder()).await.unwrap();
        a.insert_batch(corpus()).await.unwrap();
        assert_eq!(a.count().await.unwrap(), 3);
        assert_eq!(b.count().await.unwrap(), 0);
        assert!(b.retrieve("marathon", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_removes_rows() {
        let idx = SqliteIndex::create("sqlite::memory:", "empathetic_data", embedder())
            .await
            .unwrap();
        idx.insert_batch(corpus()).await.unwrap();
        idx.clear().await.unwrap();
        assert_eq!(idx.count().await.unwrap(), 0);
    }
}
