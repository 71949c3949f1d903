//! ColBERT Late-Interaction Engine
//!
//! Multi-vector retrieval: every token of a text gets its own embedding, and
//! relevance is computed with MaxSim (for each query token, the best cosine
//! similarity against any document token, summed over the query).
//!
//! ## Features
//!
//! - **Whitespace tokenizer** - Lower-cased, order-preserving tokens
//! - **Pluggable gateways** - Model2Vec static embeddings, lookup tables, opt-in LRU cache
//! - **Idempotent collection setup** - Check-then-create that tolerates create races
//! - **Vector stores** - In-memory and RocksDB persistence with exact MaxSim queries
//! - **Token-level scoring detail** - Best document match per query token
//!
//! ## Example
//!
//! ```ignore
//! use colbert_engine::{ColbertEngine, EngineConfig};
//!
//! let engine = ColbertEngine::from_config(&EngineConfig::default())?;
//! engine.initialize().await?;
//!
//! let id = engine.store_document("a red sports car", None).await?;
//! let result = engine.score("red car", "a red sports car").await?;
//! println!("{} -> {:.3}", id, result.total_score);
//! ```

pub mod collection;
pub mod config;
pub mod embedding;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod point;
pub mod scorer;
pub mod store;
pub mod tokenizer;
pub mod writer;

// Re-exports for convenience
pub use collection::CollectionManager;
pub use config::{EmbeddingConfig, EngineConfig, StoreConfig};
pub use embedding::{CachedGateway, EmbeddingGateway, LookupGateway, Model2VecGateway};
pub use encoder::{EncodedText, MultiVectorEncoder};
pub use engine::ColbertEngine;
pub use error::{ColbertError, ErrorKind, Result};
pub use point::{DocumentId, MultiVectorPoint, Payload, PayloadValue, ScoredPoint};
pub use scorer::{cosine_similarity, MaxSimScorer, ScoreResult, TokenScore};
pub use store::{
    CollectionInfo, CollectionParams, InMemoryVectorStore, RocksVectorStore, VectorStore,
};
pub use tokenizer::tokenize;
pub use writer::DocumentWriter;
