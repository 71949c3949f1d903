//! Opt-in embedding cache
//!
//! The engine never caches on its own: repeated scoring of the same text
//! re-embeds every token. Wrapping a gateway in [`CachedGateway`] trades memory
//! for fewer provider calls.

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::gateway::EmbeddingGateway;
use crate::encoder::check_vector;
use crate::error::{ColbertError, Result};

/// Embedding gateway with a bounded LRU cache
pub struct CachedGateway {
    inner: Arc<dyn EmbeddingGateway>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedGateway {
    /// Wrap `inner`, keeping at most `capacity` embeddings
    pub fn new(inner: Arc<dyn EmbeddingGateway>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.lock().len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

#[async_trait]
impl EmbeddingGateway for CachedGateway {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.lock().get(text) {
            return Ok(cached.clone());
        }

        let embedding = self.inner.embed(text).await?;
        if check_vector(text, &embedding, None).is_ok() {
            self.cache.lock().put(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        // Check cache for all texts
        let mut results: Vec<Option<Vec<f32>>> = {
            let mut cache = self.cache.lock();
            texts.iter().map(|text| cache.get(*text).cloned()).collect()
        };

        let uncached: Vec<(usize, &str)> = results
            .iter()
            .enumerate()
            .filter(|(_, cached)| cached.is_none())
            .map(|(i, _)| (i, texts[i]))
            .collect();

        if !uncached.is_empty() {
            let uncached_texts: Vec<&str> = uncached.iter().map(|(_, t)| *t).collect();
            let fresh = self.inner.embed_batch(&uncached_texts).await?;

            if fresh.len() != uncached.len() {
                return Err(ColbertError::embedding(format!(
                    "gateway returned {} vectors for {} texts",
                    fresh.len(),
                    uncached.len()
                )));
            }
            // Malformed vectors are handed back for the encoder to reject, never cached
            let dimension = results.iter().flatten().chain(&fresh).next().map(Vec::len);
            let cacheable = uncached
                .iter()
                .zip(&fresh)
                .all(|((_, text), emb)| check_vector(text, emb, dimension).is_ok());

            let mut cache = self.cache.lock();
            for ((idx, text), emb) in uncached.iter().zip(fresh) {
                if cacheable {
                    cache.put(text.to_string(), emb.clone());
                }
                results[*idx] = Some(emb);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::MultiVectorEncoder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingGateway for CountingGateway {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                return Err(ColbertError::embedding("boom"));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn model_id(&self) -> &str {
            "counting"
        }
    }

    fn cached(capacity: usize) -> (Arc<CountingGateway>, CachedGateway) {
        let inner = Arc::new(CountingGateway {
            calls: AtomicUsize::new(0),
        });
        let gateway = CachedGateway::new(inner.clone(), NonZeroUsize::new(capacity).unwrap());
        (inner, gateway)
    }

    #[tokio::test]
    async fn test_repeated_embed_hits_cache() {
        let (inner, gateway) = cached(8);
        gateway.embed("car").await.unwrap();
        gateway.embed("car").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.cache_size(), 1);
    }

    #[tokio::test]
    async fn test_batch_only_embeds_misses() {
        let (inner, gateway) = cached(8);
        gateway.embed("red").await.unwrap();

        let vectors = gateway.embed_batch(&["red", "car", "red"]).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vec![3.0, 1.0]);
        assert_eq!(vectors[1], vec![3.0, 1.0]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (_, gateway) = cached(8);
        assert!(gateway.embed("boom").await.is_err());
        assert_eq!(gateway.cache_size(), 0);
    }

    /// Returns a NaN vector until `recover_after` calls have been made
    struct FlakyGateway {
        calls: AtomicUsize,
        recover_after: usize,
    }

    #[async_trait]
    impl EmbeddingGateway for FlakyGateway {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.recover_after {
                Ok(vec![f32::NAN, 1.0])
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_malformed_vectors_are_not_cached() {
        let inner = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            recover_after: 1,
        });
        let gateway: Arc<dyn EmbeddingGateway> = Arc::new(CachedGateway::new(
            inner.clone(),
            NonZeroUsize::new(8).unwrap(),
        ));
        let encoder = MultiVectorEncoder::new(gateway);

        assert!(matches!(
            encoder.encode("red").await,
            Err(ColbertError::EmbeddingUnavailable(_))
        ));
        assert_eq!(encoder.encode("red").await.unwrap(), vec![vec![1.0, 0.0]]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

        // The recovered vector is cached
        encoder.encode("red").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_embed_skips_malformed_vector() {
        let inner = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            recover_after: 1,
        });
        let gateway = CachedGateway::new(inner, NonZeroUsize::new(8).unwrap());
        assert!(gateway.embed("red").await.unwrap()[0].is_nan());
        assert_eq!(gateway.cache_size(), 0);
        assert_eq!(gateway.embed("red").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(gateway.cache_size(), 1);
    }

    struct RaggedBatch;

    #[async_trait]
    impl EmbeddingGateway for RaggedBatch {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| vec![1.0; i + 1])
                .collect())
        }

        fn model_id(&self) -> &str {
            "ragged"
        }
    }

    #[tokio::test]
    async fn test_ragged_batch_is_not_cached() {
        let gateway = CachedGateway::new(Arc::new(RaggedBatch), NonZeroUsize::new(8).unwrap());
        let vectors = gateway.embed_batch(&["red", "car"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![1.0, 1.0]]);
        assert_eq!(gateway.cache_size(), 0);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let (_, gateway) = cached(2);
        for text in ["a", "b", "c"] {
            gateway.embed(text).await.unwrap();
        }
        assert_eq!(gateway.cache_size(), 2);
        gateway.clear_cache();
        assert_eq!(gateway.cache_size(), 0);
    }
}
