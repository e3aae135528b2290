use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use crate::embedding::EmbeddingProvider;
use crate::StoreError;
use tellerbot_schema::ScoredPassage;

/// The similarity-search collaborator contract: query text in, scored
/// passages out, ordered by descending relevance. Threshold filtering is
/// the caller's job.
#[async_trait]
pub trait PassageSearch: Send + Sync {
    async fn search(&self, query: &str, pool_size: usize) -> Result<Vec<ScoredPassage>>;
}

/// Initialize sqlite-vec extension. Must be called before Connection::open().
fn init_sqlite_vec() {
    use rusqlite::ffi::{sqlite3, sqlite3_api_routines, sqlite3_auto_extension};

    type Sqlite3AutoExtFn =
        unsafe extern "C" fn(*mut sqlite3, *mut *mut i8, *const sqlite3_api_routines) -> i32;

    unsafe {
        sqlite3_auto_extension(Some(std::mem::transmute::<*const (), Sqlite3AutoExtFn>(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    }
}

/// Embedded vectorstore over the FAQ passage corpus: a `vec0` virtual table
/// sized to the embedding provider's dimensions, queried by KNN with
/// score = 1 - cosine distance.
#[derive(Clone)]
pub struct VectorStore {
    db: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorStore {
    pub fn open(path: &str, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self, StoreError> {
        init_sqlite_vec();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_string(),
            source,
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrate(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    pub fn open_in_memory(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self, StoreError> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        migrate(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    /// Create (or recreate on a dimension change) the vec0 table.
    fn ensure_vec_table(&self, dimensions: usize) -> Result<()> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow!("failed to lock sqlite connection"))?;

        let current_dims: Option<String> = db
            .query_row(
                "SELECT value FROM meta WHERE key = 'vec_dimensions'",
                [],
                |r| r.get(0),
            )
            .optional()?;

        let needs_recreate = match current_dims {
            Some(d) => d.parse::<usize>().unwrap_or(0) != dimensions,
            None => true,
        };

        if needs_recreate {
            db.execute_batch("DROP TABLE IF EXISTS passages_vec;")?;
            db.execute_batch(&format!(
                "CREATE VIRTUAL TABLE passages_vec USING vec0(passage_id INTEGER PRIMARY KEY, embedding float[{dimensions}] distance_metric=cosine);"
            ))?;
            db.execute(
                "INSERT INTO meta(key, value) VALUES('vec_dimensions', ?1) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![dimensions.to_string()],
            )?;
            tracing::info!("created passages_vec table with {dimensions} dimensions");
        }

        Ok(())
    }

    /// Embed and insert a batch of passages in one transaction. Returns the
    /// number of passages written.
    pub async fn add_passages(&self, texts: &[String]) -> Result<usize> {
        if texts.is_empty() {
            return Ok(0);
        }

        let embedded = self.embedder.embed(texts).await?;
        self.ensure_vec_table(embedded.dimensions)?;

        let db = Arc::clone(&self.db);
        let texts = texts.to_vec();
        let count = task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let tx = conn.unchecked_transaction()?;
            for (text, embedding) in texts.iter().zip(embedded.embeddings.iter()) {
                tx.execute(
                    "INSERT INTO passages (text) VALUES (?1)",
                    params![text],
                )?;
                let id = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO passages_vec (passage_id, embedding) VALUES (?1, ?2)",
                    params![id, embedding_to_json(embedding)],
                )?;
            }
            tx.commit()?;
            Ok::<usize, anyhow::Error>(texts.len())
        })
        .await??;

        tracing::info!(passages = count, "indexed passage batch");
        Ok(count)
    }

    pub fn passage_count(&self) -> Result<usize> {
        let conn = self
            .db
            .lock()
            .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM passages", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl PassageSearch for VectorStore {
    async fn search(&self, query: &str, pool_size: usize) -> Result<Vec<ScoredPassage>> {
        if query.trim().is_empty() || pool_size == 0 {
            return Ok(Vec::new());
        }

        let embedded = self.embedder.embed(&[query.to_owned()]).await?;
        let query_embedding = embedded
            .embeddings
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("embedding provider returned empty query embedding"))?;
        let query_json = embedding_to_json(&query_embedding);

        let db = Arc::clone(&self.db);
        let passages = task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;

            let has_vec_table: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='passages_vec'",
                    [],
                    |r| r.get(0),
                )
                .unwrap_or(false);
            if !has_vec_table {
                return Ok(Vec::new());
            }

            let mut stmt = conn.prepare(
                r#"
                SELECT p.text, v.distance
                FROM passages_vec v
                JOIN passages p ON p.id = v.passage_id
                WHERE v.embedding MATCH ?1 AND k = ?2
                "#,
            )?;
            let rows = stmt.query_map(params![query_json, pool_size as i64], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, f64>(1)?))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (text, distance) = row?;
                let score = (1.0_f64 - distance) as f32;
                out.push(ScoredPassage { text, score });
            }
            out.sort_by(|a, b| b.score.total_cmp(&a.score));
            Ok::<Vec<ScoredPassage>, anyhow::Error>(out)
        })
        .await??;

        Ok(passages)
    }
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS passages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn embedding_to_json(embedding: &[f32]) -> String {
    serde_json::to_string(embedding).unwrap_or_else(|_| "[]".to_owned())
}
