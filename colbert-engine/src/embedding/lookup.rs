//! Static lookup-table gateway
//!
//! Maps exact texts to fixed vectors. Useful offline and wherever embeddings
//! must be reproducible, e.g. tie-break and ranking tests.

use async_trait::async_trait;
use std::collections::HashMap;

use super::gateway::EmbeddingGateway;
use crate::error::{ColbertError, Result};

/// Embedding gateway backed by an in-memory table.
///
/// Texts missing from the table resolve to the fallback vector when one is
/// set, and fail with `EmbeddingUnavailable` otherwise.
#[derive(Debug, Clone, Default)]
pub struct LookupGateway {
    table: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
}

impl LookupGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.table.insert(text.into(), vector);
        self
    }

    /// Vector returned for texts that have no entry
    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[async_trait]
impl EmbeddingGateway for LookupGateway {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ColbertError::embedding(format!("no embedding for '{}'", text)))
    }

    fn model_id(&self) -> &str {
        "lookup"
    }
}
