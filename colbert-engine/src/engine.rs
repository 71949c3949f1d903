//! Engine context
//!
//! [`ColbertEngine`] owns the gateway, the store handle and the resolved
//! collection. Build it once at startup and share it behind an `Arc`.

use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::collection::CollectionManager;
use crate::config::{EngineConfig, StoreConfig};
use crate::embedding::{CachedGateway, EmbeddingGateway, Model2VecConfig, Model2VecGateway};
use crate::encoder::{EncodedText, MultiVectorEncoder};
use crate::error::Result;
use crate::point::{DocumentId, MultiVectorPoint, Payload, ScoredPoint};
use crate::scorer::{MaxSimScorer, ScoreResult};
use crate::store::{CollectionInfo, InMemoryVectorStore, RocksVectorStore, VectorStore};
use crate::writer::DocumentWriter;

/// Late-interaction engine bound to one collection
pub struct ColbertEngine {
    store: Arc<dyn VectorStore>,
    encoder: MultiVectorEncoder,
    scorer: MaxSimScorer,
    writer: DocumentWriter,
    collections: CollectionManager,
    collection_name: String,
    collection: OnceCell<CollectionInfo>,
}

impl ColbertEngine {
    /// Create an engine over explicit collaborators
    pub fn new(
        gateway: Arc<dyn EmbeddingGateway>,
        store: Arc<dyn VectorStore>,
        collection_name: impl Into<String>,
        probe_text: impl Into<String>,
    ) -> Self {
        let collection_name = collection_name.into();
        let encoder = MultiVectorEncoder::new(gateway);

        Self {
            scorer: MaxSimScorer::new(encoder.clone()),
            writer: DocumentWriter::new(store.clone(), encoder.clone(), collection_name.clone()),
            collections: CollectionManager::new(store.clone(), encoder.clone(), probe_text),
            store,
            encoder,
            collection_name,
            collection: OnceCell::new(),
        }
    }

    /// Build the Model2Vec gateway and configured store
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let model2vec = Model2VecConfig {
            normalize: config.embedding.normalize,
            ..Model2VecConfig::default()
        };
        let base: Arc<dyn EmbeddingGateway> = Arc::new(Model2VecGateway::discover(
            config.embedding.model_path.as_deref(),
            model2vec,
        )?);
        let gateway = with_cache(base, config.embedding.cache_capacity);

        let store: Arc<dyn VectorStore> = match &config.store {
            StoreConfig::Memory => Arc::new(InMemoryVectorStore::new()),
            StoreConfig::RocksDb { path } => Arc::new(RocksVectorStore::open(path)?),
        };

        Ok(Self::new(
            gateway,
            store,
            config.collection_name.clone(),
            config.probe_text.clone(),
        ))
    }

    /// Ensure the collection exists; runs the check-then-create only once
    pub async fn initialize(&self) -> Result<&CollectionInfo> {
        self.collection
            .get_or_try_init(|| self.collections.ensure_collection(&self.collection_name))
            .await
    }

    /// Per-token vectors for `text`, with labels
    pub async fn encode_tokens(&self, text: &str) -> Result<EncodedText> {
        self.encoder.encode_labeled(text).await
    }

    /// Encode and persist a document
    pub async fn store_document(&self, text: &str, metadata: Option<&Payload>) -> Result<DocumentId> {
        self.initialize().await?;
        self.writer.store(text, metadata).await
    }

    /// MaxSim relevance of `document` to `query`; does not touch the store
    pub async fn score(&self, query: &str, document: &str) -> Result<ScoreResult> {
        self.scorer.score(query, document).await
    }

    /// Rank stored documents against `query` by exact MaxSim
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        self.initialize().await?;
        let query = self.encoder.encode(query).await?;
        self.store.query(&self.collection_name, &query, limit).await
    }

    /// Fetch a stored document by id
    pub async fn get_document(&self, id: &DocumentId) -> Result<Option<MultiVectorPoint>> {
        self.initialize().await?;
        self.store.get_point(&self.collection_name, id).await
    }

    /// Delete a stored document; returns whether it existed
    pub async fn delete_document(&self, id: &DocumentId) -> Result<bool> {
        self.initialize().await?;
        self.store.delete_point(&self.collection_name, id).await
    }

    /// Number of stored documents
    pub async fn document_count(&self) -> Result<usize> {
        self.initialize().await?;
        self.store.count(&self.collection_name).await
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

fn with_cache(gateway: Arc<dyn EmbeddingGateway>, capacity: usize) -> Arc<dyn EmbeddingGateway> {
    match NonZeroUsize::new(capacity) {
        Some(capacity) => {
            log::info!("Embedding cache enabled ({} entries)", capacity);
            Arc::new(CachedGateway::new(gateway, capacity))
        }
        None => gateway,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::LookupGateway;
    use crate::error::ColbertError;

    fn engine() -> ColbertEngine {
        let gateway = LookupGateway::new()
            .with("test", vec![0.3, 0.3, 0.3])
            .with("red", vec![1.0, 0.0, 0.0])
            .with("car", vec![0.0, 1.0, 0.0])
            .with_fallback(vec![0.0, 0.0, 1.0]);
        ColbertEngine::new(
            Arc::new(gateway),
            Arc::new(InMemoryVectorStore::new()),
            "colbert_vectors",
            "test",
        )
    }

    #[tokio::test]
    async fn test_initialize_once() {
        let engine = engine();
        let first = engine.initialize().await.unwrap().clone();
        let second = engine.initialize().await.unwrap();
        assert_eq!(&first, second);
        assert_eq!(first.dimension(), 3);
    }

    #[tokio::test]
    async fn test_store_initializes_lazily() {
        let engine = engine();
        let id = engine.store_document("red car", None).await.unwrap();
        let doc = engine.get_document(&id).await.unwrap().unwrap();
        assert_eq!(doc.token_count(), Some(2));
        assert_eq!(engine.document_count().await.unwrap(), 1);

        assert!(engine.delete_document(&id).await.unwrap());
        assert!(engine.get_document(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_score_does_not_need_collection() {
        let engine = engine();
        let result = engine.score("red", "car red").await.unwrap();
        assert_eq!(result.token_scores[0].best_match_doc_token, "red");
        assert!(engine.collection.get().is_none());
    }

    #[tokio::test]
    async fn test_search_ranks_stored_documents() {
        let engine = engine();
        let red = engine.store_document("red", None).await.unwrap();
        engine.store_document("car", None).await.unwrap();

        let hits = engine.search("red", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, red);
    }

    #[tokio::test]
    async fn test_encode_tokens_reports_shape() {
        let engine = engine();
        let encoded = engine.encode_tokens("Red car wash").await.unwrap();
        assert_eq!(encoded.token_count(), 3);
        assert_eq!(encoded.dimension(), 3);
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retried() {
        let gateway = LookupGateway::new().with("red", vec![1.0]);
        let engine = ColbertEngine::new(
            Arc::new(gateway),
            Arc::new(InMemoryVectorStore::new()),
            "docs",
            "probe",
        );
        let err = engine.store_document("red", None).await.unwrap_err();
        assert!(matches!(err, ColbertError::EmbeddingUnavailable(_)));
        assert!(engine.collection.get().is_none());
    }
}
