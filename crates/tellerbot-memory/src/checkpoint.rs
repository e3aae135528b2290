use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use crate::StoreError;
use tellerbot_schema::{Intent, TurnMetadata, TurnRecord};

/// Narrow get/put contract over the last known turn per conversation. The
/// core treats the implementation as opaque and assumes nothing about
/// isolation beyond what the backend provides.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn put(&self, record: TurnRecord) -> Result<()>;
    async fn get(&self, thread_id: &str) -> Result<Option<TurnRecord>>;
}

#[derive(Clone)]
pub struct SqliteCheckpointStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteCheckpointStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_string(),
            source,
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrate(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        migrate(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS checkpoints (
            thread_id TEXT PRIMARY KEY,
            user_input TEXT NOT NULL,
            decision TEXT NOT NULL,
            final_output TEXT NOT NULL,
            metadata TEXT NOT NULL,
            at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn put(&self, record: TurnRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let metadata = serde_json::to_string(&record.metadata)?;
            let decision = serde_json::to_string(&record.decision)?;
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            conn.execute(
                r#"
                INSERT INTO checkpoints (thread_id, user_input, decision, final_output, metadata, at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(thread_id) DO UPDATE SET
                    user_input = excluded.user_input,
                    decision = excluded.decision,
                    final_output = excluded.final_output,
                    metadata = excluded.metadata,
                    at = excluded.at
                "#,
                params![
                    record.thread_id,
                    record.user_input,
                    decision,
                    record.final_output,
                    metadata,
                    record.at.to_rfc3339(),
                ],
            )?;
            Ok::<(), anyhow::Error>(())
        })
        .await??;

        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<TurnRecord>> {
        let db = Arc::clone(&self.db);
        let thread_id = thread_id.to_owned();
        task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let mut stmt = conn.prepare(
                r#"
                SELECT thread_id, user_input, decision, final_output, metadata, at
                FROM checkpoints
                WHERE thread_id = ?1
                "#,
            )?;
            let record = stmt
                .query_row(params![thread_id], row_to_record)
                .optional()?;
            Ok::<Option<TurnRecord>, anyhow::Error>(record)
        })
        .await?
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TurnRecord> {
    let decision_json: String = row.get(2)?;
    let metadata_json: String = row.get(4)?;
    let at_raw: String = row.get(5)?;

    let decision: Intent = serde_json::from_str(&decision_json)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let metadata: TurnMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let at = DateTime::parse_from_rfc3339(&at_raw)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
        .with_timezone(&Utc);

    Ok(TurnRecord {
        thread_id: row.get(0)?,
        user_input: row.get(1)?,
        decision,
        final_output: row.get(3)?,
        metadata,
        at,
    })
}
