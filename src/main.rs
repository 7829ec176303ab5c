use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docchat::agent::{AgentDefinition, DocAgent};
use docchat::config::Config;
use docchat::embedder::{Embedder, download, hash::HashEmbedder, onnx::OnnxEmbedder};
use docchat::ingest::Ingestor;
use docchat::llm::{GenerationConfig, openai::OpenAiProvider};
use docchat::server::{Server, state::AppState};
use docchat::store::Store;

#[derive(Parser)]
#[command(name = "docchat", version, about = "Retrieval-augmented document chatbot")]
struct Cli {
    /// Path to the config file (defaults to ./config.json)
    #[arg(short, long, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the documents directory into the vector store
    Ingest {
        /// Re-ingest files even when unchanged
        #[arg(long)]
        force: bool,

        /// Never download model files; fall back to the hash embedder
        #[arg(long)]
        no_download: bool,
    },
    /// Start the chat server
    Serve {
        /// Never download model files; fall back to the hash embedder
        #[arg(long)]
        no_download: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = Arc::new(Config::load(&cli.config)?);
    config.validate()?;

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data dir: {}", config.data_dir))?;

    match cli.command {
        Command::Ingest { force, no_download } => {
            // Ingestion is synchronous work (model download, inference,
            // SQLite); keep it off the async runtime's core threads.
            tokio::task::spawn_blocking(move || ingest(&config, force, no_download)).await?
        }
        Command::Serve { no_download } => serve(config, no_download).await,
    }
}

fn ingest(config: &Config, force: bool, no_download: bool) -> Result<()> {
    let embedder = build_embedder(config, no_download);
    let mut store = Store::open(config.store_path(), config.model.dimensions)
        .context("failed to open vector store")?;
    let collection_id = store.collection(&config.collection)?;

    let mut ingestor = Ingestor::new(
        &mut store,
        embedder.as_ref(),
        collection_id,
        config.chunk_size,
        config.chunk_overlap,
    );
    let report = ingestor.run(&config.documents_dir, force)?;

    println!(
        "Ingested collection '{}': {} added, {} updated, {} skipped, {} failed ({} chunks)",
        config.collection, report.added, report.updated, report.skipped, report.failed, report.chunks
    );

    Ok(())
}

async fn serve(config: Arc<Config>, no_download: bool) -> Result<()> {
    let embedder = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || build_embedder(&config, no_download)).await?
    };
    let store = Store::open(config.store_path(), config.model.dimensions)
        .context("failed to open vector store")?;
    let collection_id = store.collection(&config.collection)?;

    let api_key = config.llm_api_key();
    if api_key.is_none() {
        warn!(
            "{} is not set; requests to {} will be unauthenticated",
            config.llm.api_key_env, config.llm.base_url
        );
    }

    let provider = Arc::new(OpenAiProvider::new(&config.llm, api_key)?);
    let generation = GenerationConfig {
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
    };
    let agent = DocAgent::new(AgentDefinition::default(), provider, generation);

    info!(
        "Answering from collection '{}' via {} ({})",
        config.collection, config.llm.base_url, config.llm.model
    );

    let state = AppState::new(store, collection_id, embedder, agent, config);
    Server::new(state).start().await
}

/// Pick the embedder: the ONNX model when its files are available
/// (downloading them unless told not to), the hash embedder otherwise.
fn build_embedder(config: &Config, no_download: bool) -> Arc<dyn Embedder> {
    let model_dir = config.model_dir();

    if !download::all_files_present(&model_dir) && !no_download {
        if let Err(e) = download::download_model_files(&model_dir) {
            warn!("Model download failed: {e:#}");
        }
    }

    if download::all_files_present(&model_dir) {
        match OnnxEmbedder::new(&model_dir, config.model.dimensions) {
            Ok(embedder) => return Arc::new(embedder),
            Err(e) => warn!("Failed to load ONNX embedder: {e}"),
        }
    }

    warn!("Using hash embedder; retrieval quality will be poor until model files are available");
    Arc::new(HashEmbedder::new(config.model.dimensions))
}
