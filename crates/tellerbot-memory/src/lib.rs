pub mod checkpoint;
pub mod embedding;
pub mod vectorstore;

pub use checkpoint::{CheckpointStore, SqliteCheckpointStore};
pub use embedding::{EmbeddingProvider, EmbeddingResult, OllamaEmbedding};
pub use vectorstore::{PassageSearch, VectorStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("schema migration failed: {0}")]
    Migration(#[from] rusqlite::Error),
}
