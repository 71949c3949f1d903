//! Vector store abstraction
//!
//! A store holds named multi-vector collections. Creation of a collection is
//! atomic inside the store: when two callers race, one succeeds and the other
//! gets [`ColbertError::CollectionExists`].

mod memory;
mod rocks;

pub use memory::InMemoryVectorStore;
pub use rocks::RocksVectorStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{ColbertError, Result};
use crate::point::{DocumentId, MultiVectorPoint, Payload, ScoredPoint};
use crate::scorer::max_sim;

/// Distance metric between individual vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
}

/// How per-token similarities are aggregated into a point score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiVectorComparator {
    #[default]
    MaxSim,
}

/// Parameters fixed at collection creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionParams {
    pub dimension: usize,
    pub distance: Distance,
    pub comparator: MultiVectorComparator,
}

impl CollectionParams {
    /// Cosine distance with MaxSim aggregation
    pub fn max_sim(dimension: usize) -> Self {
        Self {
            dimension,
            distance: Distance::Cosine,
            comparator: MultiVectorComparator::MaxSim,
        }
    }
}

/// Description of an existing collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub name: String,
    pub params: CollectionParams,
    pub created_at: DateTime<Utc>,
}

impl CollectionInfo {
    pub fn new(name: impl Into<String>, params: CollectionParams) -> Self {
        Self {
            name: name.into(),
            params,
            created_at: Utc::now(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.params.dimension
    }
}

/// Storage for multi-vector collections
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Names of all collections
    async fn list_collections(&self) -> Result<HashSet<String>>;

    /// Create a collection; fails with `CollectionExists` if the name is taken
    async fn create_collection(&self, name: &str, params: CollectionParams)
        -> Result<CollectionInfo>;

    /// Describe a collection, `None` if it does not exist
    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// Insert or replace a point; all-or-nothing
    async fn upsert(&self, collection: &str, point: MultiVectorPoint) -> Result<()>;

    /// Fetch a point by id
    async fn get_point(&self, collection: &str, id: &DocumentId)
        -> Result<Option<MultiVectorPoint>>;

    /// Delete a point; returns whether it existed
    async fn delete_point(&self, collection: &str, id: &DocumentId) -> Result<bool>;

    /// Exact MaxSim ranking of the collection's points against `query`
    async fn query(
        &self,
        collection: &str,
        query: &[Vec<f32>],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Number of points in a collection
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Collection names are used as key prefixes by persistent stores
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(':') {
        return Err(ColbertError::config(format!(
            "invalid collection name '{}': must be non-empty and contain no ':'",
            name
        )));
    }
    Ok(())
}

/// Every vector of `vectors` must match the collection dimension
pub(crate) fn check_dimension(info: &CollectionInfo, vectors: &[Vec<f32>]) -> Result<()> {
    let expected = info.dimension();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(ColbertError::invariant(format!(
            "collection '{}' expects {}d vectors, got {}d",
            info.name,
            expected,
            bad.len()
        )));
    }
    Ok(())
}

/// Score candidates by MaxSim, best first, ties by ascending id
pub(crate) fn rank_points<I>(candidates: I, query: &[Vec<f32>], limit: usize) -> Result<Vec<ScoredPoint>>
where
    I: IntoIterator<Item = (DocumentId, Vec<Vec<f32>>, Payload)>,
{
    let mut scored = Vec::new();
    for (id, vectors, payload) in candidates {
        let (score, _) = max_sim(query, &vectors)?;
        scored.push(ScoredPoint { id, score, payload });
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(limit);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("colbert_vectors").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("a:b").is_err());
    }

    #[test]
    fn test_check_dimension() {
        let info = CollectionInfo::new("x", CollectionParams::max_sim(2));
        assert!(check_dimension(&info, &[vec![1.0, 0.0]]).is_ok());
        assert!(check_dimension(&info, &[]).is_ok());
        let err = check_dimension(&info, &[vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, ColbertError::InvariantViolation(_)));
    }

    #[test]
    fn test_rank_points_orders_by_score_then_id() {
        let low = DocumentId::new();
        let (tie_a, tie_b) = {
            let (a, b) = (DocumentId::new(), DocumentId::new());
            if a < b {
                (a, b)
            } else {
                (b, a)
            }
        };

        let candidates = vec![
            (low, vec![vec![0.0, 1.0]], Payload::new()),
            (tie_b, vec![vec![1.0, 0.0]], Payload::new()),
            (tie_a, vec![vec![2.0, 0.0]], Payload::new()),
        ];
        let ranked = rank_points(candidates, &[vec![1.0, 0.0]], 10).unwrap();

        let ids: Vec<DocumentId> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![tie_a, tie_b, low]);

        let top = rank_points(
            vec![(low, vec![vec![0.0, 1.0]], Payload::new())],
            &[vec![1.0, 0.0]],
            0,
        )
        .unwrap();
        assert!(top.is_empty());
    }

    #[test]
    fn test_collection_info_serializes_params() {
        let info = CollectionInfo::new("docs", CollectionParams::max_sim(256));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["params"]["dimension"], 256);
        assert_eq!(json["params"]["distance"], "cosine");
        assert_eq!(json["params"]["comparator"], "max_sim");
    }
}
