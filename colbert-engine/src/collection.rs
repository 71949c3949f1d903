//! Collection manager
//!
//! Check-then-create for multi-vector collections. The check and the create
//! are separate store calls, so two first-time callers can both decide to
//! create; the loser's `CollectionExists` is treated as success.

use std::sync::Arc;

use crate::encoder::MultiVectorEncoder;
use crate::error::{ColbertError, Result};
use crate::store::{CollectionInfo, CollectionParams, VectorStore};

/// Ensures collections exist with the gateway's dimension
#[derive(Clone)]
pub struct CollectionManager {
    store: Arc<dyn VectorStore>,
    encoder: MultiVectorEncoder,
    probe_text: String,
}

impl CollectionManager {
    pub fn new(
        store: Arc<dyn VectorStore>,
        encoder: MultiVectorEncoder,
        probe_text: impl Into<String>,
    ) -> Self {
        Self {
            store,
            encoder,
            probe_text: probe_text.into(),
        }
    }

    /// Make sure `name` exists, creating it on first use.
    ///
    /// An existing collection is returned as is; its dimension is never
    /// changed.
    pub async fn ensure_collection(&self, name: &str) -> Result<CollectionInfo> {
        let existing = self.store.list_collections().await?;
        if existing.contains(name) {
            log::debug!("Collection '{}' already present", name);
            return self.describe(name).await;
        }

        let dimension = self.encoder.probe_dimension(&self.probe_text).await?;
        log::info!("Creating collection: {} ({}d, cosine, max_sim)", name, dimension);

        match self
            .store
            .create_collection(name, CollectionParams::max_sim(dimension))
            .await
        {
            Ok(info) => {
                log::info!("Collection '{}' created with dimension: {}", name, dimension);
                Ok(info)
            }
            Err(ColbertError::CollectionExists(_)) => {
                log::warn!("Collection '{}' was created concurrently, reusing it", name);
                self.describe(name).await
            }
            Err(e) => {
                log::error!("Failed to create collection '{}': {}", name, e);
                Err(e)
            }
        }
    }

    async fn describe(&self, name: &str) -> Result<CollectionInfo> {
        self.store.collection_info(name).await?.ok_or_else(|| {
            ColbertError::store(format!("collection '{}' listed but not describable", name))
        })
    }
}
