//! Command implementations
//!
//! Each command builds the engine from configuration, runs one operation and
//! prints its JSON result.

use anyhow::Context;
use colbert_engine::{ColbertEngine, DocumentId, EngineConfig, Payload, PayloadValue};
use serde::Serialize;
use std::time::Instant;

use crate::Command;

/// Parse a `KEY=VALUE` metadata flag
pub(crate) fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodeOutput {
    token_count: usize,
    embedding_dimension: usize,
    tokens: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    processing_time_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreOutput {
    document_id: String,
    processing_time_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteOutput {
    document_id: String,
    deleted: bool,
}

fn metadata_payload(meta: Vec<(String, String)>) -> Option<Payload> {
    if meta.is_empty() {
        return None;
    }
    Some(
        meta.into_iter()
            .map(|(k, v)| (k, PayloadValue::String(v)))
            .collect(),
    )
}

fn parse_id(raw: &str) -> anyhow::Result<DocumentId> {
    raw.parse::<DocumentId>()
        .with_context(|| format!("'{}' is not a document id", raw))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one command against a freshly built engine
pub(crate) async fn run(config: &EngineConfig, command: Command) -> anyhow::Result<()> {
    let engine = ColbertEngine::from_config(config).context("failed to build engine")?;
    execute(&engine, command).await
}

async fn execute(engine: &ColbertEngine, command: Command) -> anyhow::Result<()> {
    let start = Instant::now();

    match command {
        Command::Init => {
            let info = engine.initialize().await?;
            tracing::info!(
                "Collection '{}' ready ({}d)",
                info.name,
                info.dimension()
            );
            print_json(info)
        }
        Command::Encode { text } => {
            let encoded = engine.encode_tokens(&text).await?;
            tracing::info!("Encoded {} tokens", encoded.token_count());
            print_json(&EncodeOutput {
                token_count: encoded.token_count(),
                embedding_dimension: encoded.dimension(),
                tokens: encoded.tokens,
                embeddings: encoded.vectors,
                processing_time_ms: start.elapsed().as_millis() as u64,
            })
        }
        Command::Store { text, meta } => {
            let metadata = metadata_payload(meta);
            let id = engine.store_document(&text, metadata.as_ref()).await?;
            tracing::info!("Stored document {}", id);
            print_json(&StoreOutput {
                document_id: id.to_string(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            })
        }
        Command::Score { query, document } => {
            let result = engine.score(&query, &document).await?;
            print_json(&result)
        }
        Command::Search { query, limit } => {
            let hits = engine.search(&query, limit).await?;
            tracing::info!("Search returned {} hits", hits.len());
            print_json(&hits)
        }
        Command::Get { id } => {
            let id = parse_id(&id)?;
            match engine.get_document(&id).await? {
                Some(point) => print_json(&point),
                None => anyhow::bail!("document {} not found", id),
            }
        }
        Command::Delete { id } => {
            let id = parse_id(&id)?;
            let deleted = engine.delete_document(&id).await?;
            print_json(&DeleteOutput {
                document_id: id.to_string(),
                deleted,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colbert_engine::{InMemoryVectorStore, LookupGateway};
    use std::sync::Arc;

    fn engine() -> ColbertEngine {
        ColbertEngine::new(
            Arc::new(LookupGateway::new().with_fallback(vec![0.6, 0.8])),
            Arc::new(InMemoryVectorStore::new()),
            "cli_test",
            "test",
        )
    }

    #[test]
    fn test_parse_meta() {
        assert_eq!(
            parse_meta("source=a=b"),
            Ok(("source".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_meta("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=value").is_err());
    }

    #[test]
    fn test_metadata_payload() {
        assert!(metadata_payload(vec![]).is_none());
        let payload = metadata_payload(vec![("k".into(), "v".into())]).unwrap();
        assert_eq!(payload["k"], PayloadValue::String("v".into()));
    }

    #[tokio::test]
    async fn test_execute_store_then_delete() {
        let engine = engine();
        execute(
            &engine,
            Command::Store {
                text: "hello world".into(),
                meta: vec![("source".into(), "test".into())],
            },
        )
        .await
        .unwrap();
        assert_eq!(engine.document_count().await.unwrap(), 1);

        let missing = DocumentId::new().to_string();
        execute(&engine, Command::Delete { id: missing.clone() })
            .await
            .unwrap();
        assert!(execute(&engine, Command::Get { id: missing }).await.is_err());
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_id() {
        let err = execute(&engine(), Command::Get { id: "nope".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a document id"));
    }
}
