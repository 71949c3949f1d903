//! Model2Vec static embeddings
//!
//! Fast local embeddings using static lookup tables. Each token of a document
//! is embedded on its own, so a static model is a good fit for per-token
//! vectors.

use async_trait::async_trait;
use model2vec_rs::model::StaticModel;
use std::path::Path;

use super::discovery::find_model2vec_path;
use super::gateway::EmbeddingGateway;
use crate::error::{ColbertError, Result};

/// Model2Vec configuration
#[derive(Debug, Clone)]
pub struct Model2VecConfig {
    /// Whether to normalize embeddings (default: true)
    pub normalize: bool,
    /// Batch size for encoding (default: 1024)
    pub batch_size: usize,
}

impl Default for Model2VecConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            batch_size: 1024,
        }
    }
}

/// Model2Vec-backed embedding gateway
pub struct Model2VecGateway {
    model: StaticModel,
    config: Model2VecConfig,
    model_id: String,
    dimension: usize,
}

impl Model2VecGateway {
    /// Discover the model (see [`find_model2vec_path`]) and load it
    pub fn discover(configured: Option<&Path>, config: Model2VecConfig) -> Result<Self> {
        let model_path = find_model2vec_path(configured)?;
        Self::from_pretrained_with_config(&model_path, config)
    }

    /// Load Model2Vec from local path
    ///
    /// Required files in the directory:
    /// - model.safetensors
    /// - tokenizer.json
    /// - config.json
    pub fn from_pretrained(model_path: &Path) -> Result<Self> {
        Self::from_pretrained_with_config(model_path, Model2VecConfig::default())
    }

    /// Load Model2Vec with custom configuration
    pub fn from_pretrained_with_config(model_path: &Path, config: Model2VecConfig) -> Result<Self> {
        let safetensors_path = model_path.join("model.safetensors");
        if !safetensors_path.exists() {
            return Err(ColbertError::config(format!(
                "Model2Vec model not found at: {}",
                safetensors_path.display()
            )));
        }

        log::info!("Loading Model2Vec from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, Some(config.normalize), None)
            .map_err(|e| ColbertError::config(format!("Failed to load Model2Vec: {}", e)))?;

        let probe = model.encode_single("test");
        let dimension = probe.len();
        if dimension == 0 {
            return Err(ColbertError::embedding("Model2Vec produced an empty vector"));
        }

        let model_id = model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model2vec".to_string());

        log::info!(
            "Loaded Model2Vec '{}' ({}d, normalize: {})",
            model_id,
            dimension,
            config.normalize
        );

        Ok(Self {
            model,
            config,
            model_id,
            dimension,
        })
    }

    /// Embedding dimension reported by the loaded model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get configuration
    pub fn config(&self) -> &Model2VecConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingGateway for Model2VecGateway {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.model.encode_single(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            let sentences: Vec<String> = chunk.iter().map(|t| t.to_string()).collect();
            let encoded = self.model.encode(&sentences);
            if encoded.len() != chunk.len() {
                return Err(ColbertError::embedding(format!(
                    "Model2Vec returned {} vectors for {} texts",
                    encoded.len(),
                    chunk.len()
                )));
            }
            vectors.extend(encoded);
        }
        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
