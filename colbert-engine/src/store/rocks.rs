//! RocksDB-backed vector store
//!
//! Key layout:
//! - `col:{collection}` -> bincode `CollectionInfo`
//! - `pt:{collection}:{id}` -> MessagePack payload
//! - `vec:{collection}:{id}` -> bincode token vectors
//!
//! A point's two records are written in one `WriteBatch`, so a failed upsert
//! leaves nothing visible.

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use super::{
    check_dimension, rank_points, validate_collection_name, CollectionInfo, CollectionParams,
    VectorStore,
};
use crate::error::{ColbertError, Result};
use crate::point::{DocumentId, MultiVectorPoint, Payload, ScoredPoint};

/// On-disk format version stored in metadata
const DB_VERSION_KEY: &[u8] = b"_db_version";
const CURRENT_VERSION: u32 = 1;

const COLLECTION_PREFIX: &str = "col:";

fn collection_key(name: &str) -> String {
    format!("{}{}", COLLECTION_PREFIX, name)
}

fn payload_prefix(collection: &str) -> String {
    format!("pt:{}:", collection)
}

fn payload_key(collection: &str, id: &DocumentId) -> String {
    format!("pt:{}:{}", collection, id)
}

fn vector_key(collection: &str, id: &DocumentId) -> String {
    format!("vec:{}:{}", collection, id)
}

/// Persistent store for multi-vector collections
pub struct RocksVectorStore {
    db: Arc<DB>,
    create_lock: Mutex<()>,
}

impl RocksVectorStore {
    /// Open (or create) a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_background_jobs(2);
        opts.set_bytes_per_sync(1048576); // 1MB
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;
        check_version(&db)?;

        log::info!("RocksVectorStore opened at: {}", path.display());

        Ok(Self {
            db: Arc::new(db),
            create_lock: Mutex::new(()),
        })
    }

    fn read_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        match self.db.get(collection_key(name).as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn require_info(&self, name: &str) -> Result<CollectionInfo> {
        self.read_info(name)?
            .ok_or_else(|| ColbertError::CollectionNotFound(name.to_string()))
    }

    fn read_point(&self, collection: &str, id: &DocumentId) -> Result<Option<MultiVectorPoint>> {
        let payload = match self.db.get(payload_key(collection, id).as_bytes())? {
            Some(bytes) => rmp_serde::from_slice::<Payload>(&bytes)?,
            None => return Ok(None),
        };
        let vectors = match self.db.get(vector_key(collection, id).as_bytes())? {
            Some(bytes) => bincode::deserialize::<Vec<Vec<f32>>>(&bytes)?,
            None => {
                return Err(ColbertError::store(format!(
                    "point {} in '{}' has a payload but no vectors",
                    id, collection
                )))
            }
        };
        Ok(Some(MultiVectorPoint::new(*id, vectors, payload)))
    }

    /// Ids of every point in a collection, in key order
    fn point_ids(&self, collection: &str) -> Result<Vec<DocumentId>> {
        let prefix = payload_prefix(collection);
        let mut ids = Vec::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            let Some(rest) = key.strip_prefix(prefix.as_bytes()) else {
                break;
            };
            let id_str = String::from_utf8_lossy(rest);
            match id_str.parse::<DocumentId>() {
                Ok(id) => ids.push(id),
                Err(e) => log::warn!("Skipping malformed point key {}: {}", id_str, e),
            }
        }
        Ok(ids)
    }
}

fn check_version(db: &DB) -> Result<()> {
    match db.get(DB_VERSION_KEY)? {
        Some(bytes) => {
            let version_bytes: [u8; 4] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| ColbertError::store("Invalid version format"))?;
            let version = u32::from_le_bytes(version_bytes);
            if version > CURRENT_VERSION {
                return Err(ColbertError::config(format!(
                    "database format v{} is newer than supported v{}",
                    version, CURRENT_VERSION
                )));
            }
            log::debug!("Database version: {}", version);
        }
        None => {
            db.put(DB_VERSION_KEY, CURRENT_VERSION.to_le_bytes())?;
        }
    }
    Ok(())
}

#[async_trait]
impl VectorStore for RocksVectorStore {
    async fn list_collections(&self) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        let iter = self.db.iterator(IteratorMode::From(
            COLLECTION_PREFIX.as_bytes(),
            Direction::Forward,
        ));
        for item in iter {
            let (key, _) = item?;
            let Some(name) = key.strip_prefix(COLLECTION_PREFIX.as_bytes()) else {
                break;
            };
            names.insert(String::from_utf8_lossy(name).into_owned());
        }
        Ok(names)
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

        let _guard = self.create_lock.lock();
        if self.read_info(name)?.is_some() {
            return Err(ColbertError::CollectionExists(name.to_string()));
        }

        let info = CollectionInfo::new(name, params);
        self.db
            .put(collection_key(name).as_bytes(), bincode::serialize(&info)?)?;
        self.db.flush()?;
        Ok(info)
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        self.read_info(name)
    }

    async fn upsert(&self, collection: &str, point: MultiVectorPoint) -> Result<()> {
        let info = self.require_info(collection)?;
        check_dimension(&info, &point.vectors)?;

        let mut batch = WriteBatch::default();
        batch.put(
            payload_key(collection, &point.id).as_bytes(),
            rmp_serde::to_vec(&point.payload)?,
        );
        batch.put(
            vector_key(collection, &point.id).as_bytes(),
            bincode::serialize(&point.vectors)?,
        );
        self.db.write(batch)?;
        self.db.flush()?;
        Ok(())
    }

    async fn get_point(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<MultiVectorPoint>> {
        self.require_info(collection)?;
        self.read_point(collection, id)
    }

    async fn delete_point(&self, collection: &str, id: &DocumentId) -> Result<bool> {
        self.require_info(collection)?;
        let pt_key = payload_key(collection, id);
        let existed = self.db.get(pt_key.as_bytes())?.is_some();

        let mut batch = WriteBatch::default();
        batch.delete(pt_key.as_bytes());
        batch.delete(vector_key(collection, id).as_bytes());
        self.db.write(batch)?;
        self.db.flush()?;
        Ok(existed)
    }

    async fn query(
        &self,
        collection: &str,
        query: &[Vec<f32>],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let info = self.require_info(collection)?;
        check_dimension(&info, query)?;

        let mut candidates = Vec::new();
        for id in self.point_ids(collection)? {
            if let Some(point) = self.read_point(collection, &id)? {
                candidates.push((point.id, point.vectors, point.payload));
            }
        }
        rank_points(candidates, query, limit)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.require_info(collection)?;
        Ok(self.point_ids(collection)?.len())
    }
}
