/// Configuration module for docchat.
///
/// Handles loading, validating, and providing default configuration values
/// for every stage: ingestion, the vector store, the embedding model, the
/// LLM endpoint, and the HTTP server.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_documents_dir() -> String {
    "./documents".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_collection() -> String {
    "doc_chunks".to_string()
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_search_top_k() -> usize {
    4
}

fn default_model_name() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8008
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.2
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory the document loader reads.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    /// Directory holding the persistent vector store file.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Name of the vector collection documents are ingested into.
    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (no trailing `/chat/completions`).
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    /// The key itself never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            data_dir: default_data_dir(),
            collection: default_collection(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_top_k: default_search_top_k(),
            model: ModelConfig::default(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            dimensions: default_dimensions(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        anyhow::ensure!(
            !self.collection.is_empty(),
            "collection name must not be empty"
        );
        anyhow::ensure!(
            !self.documents_dir.is_empty(),
            "documents_dir must not be empty"
        );
        Ok(())
    }

    /// Path of the vector store database file under `data_dir`.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("vectors.db")
    }

    /// Directory the embedding model files live in, under `data_dir`.
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("models").join(&self.model.name)
    }

    /// Read the LLM API key from the configured environment variable.
    /// Returns `None` when unset or empty (e.g. local Ollama endpoints).
    #[must_use]
    pub fn llm_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.search_top_k, 4);
        assert_eq!(config.collection, "doc_chunks");
        assert_eq!(config.model.dimensions, 384);
        assert_eq!(config.model.name, "bge-small-en-v1.5");
        assert_eq!(config.server.port, 8008);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"chunk_size": 500, "documents_dir": "./docs"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.documents_dir, "./docs");
        // Other fields should have defaults
        assert_eq!(config.search_top_k, 4);
        assert_eq!(config.model.dimensions, 384);
    }

    #[test]
    fn test_nested_sections_from_json() {
        let json = r#"{"server": {"port": 9000}, "llm": {"model": "llama3", "base_url": "http://localhost:11434/v1"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.max_tokens, 1024);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_chunk_size() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_exceeds_chunk() {
        let mut config = Config::default();
        config.chunk_size = 100;
        config.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_collection() {
        let mut config = Config::default();
        config.collection = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_and_model_paths() {
        let mut config = Config::default();
        config.data_dir = "/tmp/docchat".to_string();
        assert_eq!(config.store_path(), Path::new("/tmp/docchat/vectors.db"));
        assert!(
            config
                .model_dir()
                .ends_with("models/bge-small-en-v1.5")
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chunk_size, config.chunk_size);
        assert_eq!(parsed.collection, config.collection);
        assert_eq!(parsed.llm.model, config.llm.model);
    }
}
