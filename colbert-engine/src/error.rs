//! Error types for colbert-engine

use thiserror::Error;

/// Coarse classification of a [`ColbertError`].
///
/// Outer layers map these to distinguishable responses; the engine itself
/// never branches on them except to recover collection-creation races.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmbeddingUnavailable,
    StoreUnavailable,
    InvariantViolation,
    CollectionExists,
    CollectionNotFound,
    Config,
}

/// Errors that can occur in the engine
#[derive(Debug, Error)]
pub enum ColbertError {
    /// Upstream embedding call failed or returned malformed output
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Collection listing, creation, upsert or lookup failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Dimension or token-count mismatch; a programming error, not a user error
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Create was called for a collection that is already present
    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    /// Write or query against a collection that was never created
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Invalid configuration or model location
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ColbertError {
    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create an invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmbeddingUnavailable(_) => ErrorKind::EmbeddingUnavailable,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::CollectionExists(_) => ErrorKind::CollectionExists,
            Self::CollectionNotFound(_) => ErrorKind::CollectionNotFound,
            Self::Config(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Config,
        }
    }
}

impl From<rocksdb::Error> for ColbertError {
    fn from(e: rocksdb::Error) -> Self {
        Self::StoreUnavailable(format!("rocksdb: {}", e))
    }
}

impl From<bincode::Error> for ColbertError {
    fn from(e: bincode::Error) -> Self {
        Self::StoreUnavailable(format!("corrupt vector record: {}", e))
    }
}

impl From<rmp_serde::encode::Error> for ColbertError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::StoreUnavailable(format!("payload encoding failed: {}", e))
    }
}

impl From<rmp_serde::decode::Error> for ColbertError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::StoreUnavailable(format!("corrupt payload record: {}", e))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ColbertError>;
