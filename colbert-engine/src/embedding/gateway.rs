//! Embedding gateway abstraction
//!
//! The engine consumes embeddings through this trait only; concrete backends
//! live next to it in this module.

use async_trait::async_trait;

use crate::error::Result;

/// Maps a single text to a dense vector of fixed dimension.
///
/// Implementations fail with [`ColbertError::EmbeddingUnavailable`] when the
/// provider cannot be reached or returns malformed data.
///
/// [`ColbertError::EmbeddingUnavailable`]: crate::error::ColbertError::EmbeddingUnavailable
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    ///
    /// Equivalent to one `embed` call per text; backends override this when
    /// they can batch.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Identifier of the underlying model, for logs.
    fn model_id(&self) -> &str;
}
