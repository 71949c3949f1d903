//! Engine configuration
//!
//! Defaults, then an optional JSON file, then environment overrides. The CLI
//! applies its flags last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ColbertError, Result};

/// Default collection name
pub const DEFAULT_COLLECTION: &str = "colbert_vectors";

/// Default text embedded to discover the vector dimension
pub const DEFAULT_PROBE_TEXT: &str = "test";

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Collection holding the multi-vector documents
    pub collection_name: String,
    /// Text embedded once to learn the dimension before creating the collection
    pub probe_text: String,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION.to_string(),
            probe_text: DEFAULT_PROBE_TEXT.to_string(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model2Vec model directory; discovered when unset
    pub model_path: Option<PathBuf>,
    /// Whether to normalize embeddings (default: true)
    pub normalize: bool,
    /// LRU cache entries; 0 disables caching
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            normalize: true,
            cache_capacity: 0,
        }
    }
}

/// Vector store backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    Memory,
    RocksDb { path: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::RocksDb {
            path: PathBuf::from(".colbert").join("store"),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `COLBERT_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(name) = lookup("COLBERT_COLLECTION") {
            self.collection_name = name;
        }
        if let Some(probe) = lookup("COLBERT_PROBE_TEXT") {
            self.probe_text = probe;
        }
        if let Some(path) = lookup("COLBERT_DB_PATH") {
            self.store = StoreConfig::RocksDb {
                path: PathBuf::from(path),
            };
        }
        if let Some(capacity) = lookup("COLBERT_CACHE_CAPACITY") {
            self.embedding.cache_capacity = capacity.parse().map_err(|_| {
                ColbertError::config(format!("COLBERT_CACHE_CAPACITY is not a number: {}", capacity))
            })?;
        }
        Ok(self)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.collection_name.trim().is_empty() {
            return Err(ColbertError::config("collection_name must not be empty"));
        }
        if crate::tokenizer::tokenize(&self.probe_text).is_empty() {
            return Err(ColbertError::config("probe_text must contain a token"));
        }
        Ok(())
    }
}
