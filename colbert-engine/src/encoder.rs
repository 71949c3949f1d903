//! Multi-vector encoder
//!
//! Tokenizes text and embeds every token through the gateway, preserving
//! token order. Either every token is embedded or the call fails.

use serde::Serialize;
use std::sync::Arc;

use crate::embedding::EmbeddingGateway;
use crate::error::{ColbertError, Result};
use crate::tokenizer::tokenize;

/// Tokens of a text together with their vectors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncodedText {
    pub tokens: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
}

impl EncodedText {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Vector dimension, 0 when the text had no tokens
    pub fn dimension(&self) -> usize {
        self.vectors.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Drives the tokenizer and embedding gateway
#[derive(Clone)]
pub struct MultiVectorEncoder {
    gateway: Arc<dyn EmbeddingGateway>,
}

impl MultiVectorEncoder {
    pub fn new(gateway: Arc<dyn EmbeddingGateway>) -> Self {
        Self { gateway }
    }

    /// Per-token vectors for `text`
    pub async fn encode(&self, text: &str) -> Result<Vec<Vec<f32>>> {
        Ok(self.encode_labeled(text).await?.vectors)
    }

    /// Per-token vectors for `text`, keeping the token labels
    pub async fn encode_labeled(&self, text: &str) -> Result<EncodedText> {
        let tokens = tokenize(text);
        log::debug!(
            "Encoding {} tokens with '{}'",
            tokens.len(),
            self.gateway.model_id()
        );

        if tokens.is_empty() {
            return Ok(EncodedText::default());
        }

        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let vectors = self.gateway.embed_batch(&refs).await?;
        check_embeddings(&tokens, &vectors)?;

        Ok(EncodedText { tokens, vectors })
    }

    /// Embed a single probe text and return its dimension
    pub async fn probe_dimension(&self, probe: &str) -> Result<usize> {
        let vector = self.gateway.embed(probe).await?;
        check_vector(probe, &vector, None)?;
        Ok(vector.len())
    }
}

/// Reject malformed gateway output before it reaches a writer or scorer
fn check_embeddings(tokens: &[String], vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() != tokens.len() {
        return Err(ColbertError::embedding(format!(
            "gateway returned {} vectors for {} tokens",
            vectors.len(),
            tokens.len()
        )));
    }

    let dimension = vectors.first().map(Vec::len);
    for (token, vector) in tokens.iter().zip(vectors) {
        check_vector(token, vector, dimension)?;
    }
    Ok(())
}

/// Reject an empty, ragged or non-finite vector
pub(crate) fn check_vector(text: &str, vector: &[f32], expected: Option<usize>) -> Result<()> {
    if vector.is_empty() {
        return Err(ColbertError::embedding(format!(
            "empty vector for '{}'",
            text
        )));
    }
    if let Some(dim) = expected {
        if vector.len() != dim {
            return Err(ColbertError::embedding(format!(
                "vector for '{}' has {} components, expected {}",
                text,
                vector.len(),
                dim
            )));
        }
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(ColbertError::embedding(format!(
            "non-finite component in vector for '{}'",
            text
        )));
    }
    Ok(())
}
