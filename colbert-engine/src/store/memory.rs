//! In-memory vector store
//!
//! Collections live in a `DashMap`; creation goes through the entry API so a
//! duplicate create is detected atomically.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use super::{
    check_dimension, rank_points, validate_collection_name, CollectionInfo, CollectionParams,
    VectorStore,
};
use crate::error::{ColbertError, Result};
use crate::point::{DocumentId, MultiVectorPoint, ScoredPoint};

struct MemoryCollection {
    info: CollectionInfo,
    points: DashMap<DocumentId, MultiVectorPoint>,
}

/// Non-persistent store for development and tests
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, name: &str) -> Result<Arc<MemoryCollection>> {
        self.collections
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ColbertError::CollectionNotFound(name.to_string()))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn list_collections(&self) -> Result<HashSet<String>> {
        Ok(self.collections.iter().map(|e| e.key().clone()).collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        params: CollectionParams,
    ) -> Result<CollectionInfo> {
        validate_collection_name(name)?;
        if params.dimension == 0 {
            return Err(ColbertError::invariant("collection dimension must be non-zero"));
        }

        match self.collections.entry(name.to_string()) {
            Entry::Occupied(_) => Err(ColbertError::CollectionExists(name.to_string())),
            Entry::Vacant(slot) => {
                let info = CollectionInfo::new(name, params);
                slot.insert(Arc::new(MemoryCollection {
                    info: info.clone(),
                    points: DashMap::new(),
                }));
                Ok(info)
            }
        }
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        Ok(self.collections.get(name).map(|e| e.value().info.clone()))
    }

    async fn upsert(&self, collection: &str, point: MultiVectorPoint) -> Result<()> {
        let col = self.collection(collection)?;
        check_dimension(&col.info, &point.vectors)?;
        col.points.insert(point.id, point);
        Ok(())
    }

    async fn get_point(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<MultiVectorPoint>> {
        let col = self.collection(collection)?;
        let point = col.points.get(id).map(|p| p.value().clone());
        Ok(point)
    }

    async fn delete_point(&self, collection: &str, id: &DocumentId) -> Result<bool> {
        let col = self.collection(collection)?;
        let removed = col.points.remove(id).is_some();
        Ok(removed)
    }

    async fn query(
        &self,
        collection: &str,
        query: &[Vec<f32>],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let col = self.collection(collection)?;
        check_dimension(&col.info, query)?;

        let candidates: Vec<_> = col
            .points
            .iter()
            .map(|e| {
                let p = e.value();
                (p.id, p.vectors.clone(), p.payload.clone())
            })
            .collect();
        rank_points(candidates, query, limit)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let col = self.collection(collection)?;
        let len = col.points.len();
        Ok(len)
    }
}
