//! Document writer
//!
//! Encodes a text, wraps the vectors and payload into a point and upserts it.
//! Nothing reaches the store until every token is embedded.

use std::sync::Arc;

use crate::encoder::MultiVectorEncoder;
use crate::error::Result;
use crate::point::{
    DocumentId, MultiVectorPoint, Payload, PayloadValue, TEXT_FIELD, TOKEN_COUNT_FIELD,
};
use crate::store::VectorStore;

/// Persists multi-vector documents into one collection
#[derive(Clone)]
pub struct DocumentWriter {
    store: Arc<dyn VectorStore>,
    encoder: MultiVectorEncoder,
    collection: String,
}

impl DocumentWriter {
    pub fn new(
        store: Arc<dyn VectorStore>,
        encoder: MultiVectorEncoder,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            encoder,
            collection: collection.into(),
        }
    }

    /// Encode and store `text`, returning the new document id.
    ///
    /// Caller metadata is stored as strings. `text` and `token_count` are
    /// always derived from the document and override caller keys.
    pub async fn store(&self, text: &str, metadata: Option<&Payload>) -> Result<DocumentId> {
        // One vector per token is guaranteed by the encoder
        let encoded = self.encoder.encode_labeled(text).await?;
        let id = DocumentId::new();
        let token_count = encoded.token_count();
        let payload = build_payload(text, token_count, metadata);
        let point = MultiVectorPoint::new(id, encoded.vectors, payload);

        self.store.upsert(&self.collection, point).await.map_err(|e| {
            log::error!("Failed to store document in '{}': {}", self.collection, e);
            e
        })?;

        log::debug!("Stored document with id: {}, tokens: {}", id, token_count);
        Ok(id)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn build_payload(text: &str, token_count: usize, metadata: Option<&Payload>) -> Payload {
    let mut payload: Payload = metadata
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), PayloadValue::String(v.to_string())))
        .collect();
    payload.insert(TEXT_FIELD.to_string(), text.into());
    payload.insert(
        TOKEN_COUNT_FIELD.to_string(),
        PayloadValue::Integer(token_count as i64),
    );
    payload
}
