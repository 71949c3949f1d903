//! Point and payload types
//!
//! A point is the unit persisted in a collection: one document id, the
//! document's per-token vectors and a scalar payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Payload key holding the source text
pub const TEXT_FIELD: &str = "text";

/// Payload key holding the number of token vectors
pub const TOKEN_COUNT_FIELD: &str = "token_count";

/// Unique identifier for stored documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Create a new random DocumentId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Scalar payload value.
///
/// The engine never inspects caller values; they are passed through as
/// strings. Only derived fields such as `token_count` are numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Integer(i64),
    Float(f64),
    String(String),
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for PayloadValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for PayloadValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl std::fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Point payload, ordered by key
pub type Payload = BTreeMap<String, PayloadValue>;

/// A stored multi-vector document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiVectorPoint {
    pub id: DocumentId,
    /// One vector per token, in token order
    pub vectors: Vec<Vec<f32>>,
    pub payload: Payload,
}

impl MultiVectorPoint {
    pub fn new(id: DocumentId, vectors: Vec<Vec<f32>>, payload: Payload) -> Self {
        Self {
            id,
            vectors,
            payload,
        }
    }

    /// Number of token vectors
    pub fn num_tokens(&self) -> usize {
        self.vectors.len()
    }

    /// Vector dimension (from the first token, or 0 if empty)
    pub fn dimension(&self) -> usize {
        self.vectors.first().map_or(0, Vec::len)
    }

    /// Source text, when the payload carries it
    pub fn text(&self) -> Option<&str> {
        self.payload.get(TEXT_FIELD).and_then(PayloadValue::as_str)
    }

    /// Token count recorded in the payload
    pub fn token_count(&self) -> Option<i64> {
        self.payload
            .get(TOKEN_COUNT_FIELD)
            .and_then(PayloadValue::as_i64)
    }
}

/// A query hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPoint {
    pub id: DocumentId,
    pub score: f64,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_round_trips_through_string() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_payload_json_shape() {
        let mut payload = Payload::new();
        payload.insert(TEXT_FIELD.into(), "red car".into());
        payload.insert(TOKEN_COUNT_FIELD.into(), 2i64.into());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"text": "red car", "token_count": 2}));

        let back: Payload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_point_accessors() {
        let mut payload = Payload::new();
        payload.insert(TEXT_FIELD.into(), "a b".into());
        payload.insert(TOKEN_COUNT_FIELD.into(), 2i64.into());
        let point = MultiVectorPoint::new(
            DocumentId::new(),
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            payload,
        );

        assert_eq!(point.num_tokens(), 2);
        assert_eq!(point.dimension(), 3);
        assert_eq!(point.text(), Some("a b"));
        assert_eq!(point.token_count(), Some(2));
    }
}
