//! ColBERT Engine CLI Entry Point
//!
//! Encodes, stores, scores and searches multi-vector documents from the
//! command line. Every command prints a JSON document on stdout; logs go to
//! stderr.

mod commands;

use clap::{Parser, Subcommand};
use colbert_engine::{ColbertError, EngineConfig, ErrorKind, StoreConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "colbert")]
#[command(about = "ColBERT-style late-interaction retrieval")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Collection name (overrides config and COLBERT_COLLECTION)
    #[arg(long, global = true)]
    collection: Option<String>,

    /// RocksDB directory for the vector store
    #[arg(long, global = true, conflicts_with = "memory")]
    db_path: Option<PathBuf>,

    /// Keep the vector store in memory (nothing is persisted)
    #[arg(long, global = true)]
    memory: bool,

    /// Model2Vec model directory
    #[arg(long, global = true)]
    model_path: Option<PathBuf>,

    /// Cache up to N token embeddings for the duration of the command
    #[arg(long, global = true)]
    cache: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the collection if it does not exist yet
    Init,
    /// Print per-token vectors for a text
    Encode { text: String },
    /// Encode and persist a document
    Store {
        text: String,
        /// Metadata entry, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = commands::parse_meta)]
        meta: Vec<(String, String)>,
    },
    /// MaxSim score of a document against a query
    Score {
        #[arg(long, short)]
        query: String,
        #[arg(long, short)]
        document: String,
    },
    /// Rank stored documents against a query
    Search {
        query: String,
        #[arg(long, short, default_value_t = 10)]
        limit: usize,
    },
    /// Fetch a stored document
    Get { id: String },
    /// Delete a stored document
    Delete { id: String },
}

impl Args {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let base = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        let mut config = base.with_env_overrides()?;

        if let Some(name) = &self.collection {
            config.collection_name = name.clone();
        }
        if let Some(path) = &self.db_path {
            config.store = StoreConfig::RocksDb { path: path.clone() };
        }
        if self.memory {
            config.store = StoreConfig::Memory;
        }
        if let Some(path) = &self.model_path {
            config.embedding.model_path = Some(path.clone());
        }
        if let Some(capacity) = self.cache {
            config.embedding.cache_capacity = capacity;
        }
        Ok(config)
    }
}

/// Exit status for a failed command, by error kind
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ColbertError>().map(ColbertError::kind) {
        Some(ErrorKind::EmbeddingUnavailable) => 3,
        Some(ErrorKind::StoreUnavailable)
        | Some(ErrorKind::CollectionExists)
        | Some(ErrorKind::CollectionNotFound) => 4,
        Some(ErrorKind::InvariantViolation) => 70,
        Some(ErrorKind::Config) => 78,
        None => 1,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colbert_cli=info,colbert_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match args.engine_config() {
        Ok(config) => commands::run(&config, args.command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(exit_code(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_command() {
        let args = Args::try_parse_from([
            "colbert", "--memory", "score", "-q", "red car", "-d", "a red sports car",
        ])
        .unwrap();
        assert!(args.memory);
        match args.command {
            Command::Score { query, document } => {
                assert_eq!(query, "red car");
                assert_eq!(document, "a red sports car");
            }
            _ => panic!("expected score"),
        }
    }

    #[test]
    fn test_parse_store_metadata() {
        let args = Args::try_parse_from([
            "colbert", "store", "some text", "--meta", "source=cli", "--meta", "lang=en",
        ])
        .unwrap();
        match args.command {
            Command::Store { text, meta } => {
                assert_eq!(text, "some text");
                assert_eq!(
                    meta,
                    vec![
                        ("source".to_string(), "cli".to_string()),
                        ("lang".to_string(), "en".to_string())
                    ]
                );
            }
            _ => panic!("expected store"),
        }
    }

    #[test]
    fn test_memory_conflicts_with_db_path() {
        let parsed = Args::try_parse_from(["colbert", "--memory", "--db-path", "/tmp/x", "init"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "colbert", "--collection", "cli_docs", "--memory", "--cache", "32", "init",
        ])
        .unwrap();
        let config = args.engine_config().unwrap();
        assert_eq!(config.collection_name, "cli_docs");
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.embedding.cache_capacity, 32);
    }

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let err = anyhow::Error::new(ColbertError::embedding("down"));
        assert_eq!(exit_code(&err), 3);
        let err = anyhow::Error::new(ColbertError::invariant("dim"));
        assert_eq!(exit_code(&err), 70);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
