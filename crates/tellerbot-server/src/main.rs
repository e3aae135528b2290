use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use tellerbot_core::{AuditLog, Orchestrator};
use tellerbot_memory::{OllamaEmbedding, SqliteCheckpointStore, VectorStore};
use tellerbot_provider::OllamaGenerator;
use tellerbot_server::config;
use tellerbot_server::state::AppState;

#[derive(Parser)]
#[command(name = "tellerbot", version, about = "Banking FAQ routing service")]
struct Cli {
    #[arg(long, default_value = "config.yaml", help = "Path to the YAML config file")]
    config: PathBuf,

    #[arg(long, help = "Override the bind address from the config")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = config::load_or_default(&cli.config)?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let embedder = Arc::new(OllamaEmbedding::new(
        &config.embedding.base_url,
        &config.embedding.model,
        config.embedding.dimensions,
    ));
    let vectorstore = Arc::new(VectorStore::open(&config.store.vector_path, embedder)?);

    if let Some(seed_path) = &config.corpus.seed_path {
        seed_corpus(&vectorstore, seed_path).await?;
    }

    let generator = Arc::new(OllamaGenerator::new(
        &config.generation.base_url,
        &config.generation.model,
    ));
    let checkpoints = Arc::new(SqliteCheckpointStore::open(&config.store.checkpoint_path)?);
    let audit = AuditLog::new(&config.audit.path);

    let orchestrator = Arc::new(Orchestrator::new(
        vectorstore,
        generator,
        checkpoints,
        audit,
    ));

    tracing::info!(
        app = %config.app.name,
        env = %config.app.env,
        "starting up"
    );
    tellerbot_server::serve(AppState { orchestrator }, &bind).await
}

/// Index the FAQ corpus on first boot. Passages are blank-line separated
/// blocks; an already-populated store is left alone.
async fn seed_corpus(store: &VectorStore, path: &str) -> Result<()> {
    if store.passage_count()? > 0 {
        tracing::info!("vectorstore already populated, skipping corpus seed");
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    let passages: Vec<String> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect();

    if passages.is_empty() {
        tracing::warn!(path, "corpus seed file contains no passages");
        return Ok(());
    }

    let count = store.add_passages(&passages).await?;
    tracing::info!(count, path, "seeded FAQ corpus");
    Ok(())
}
