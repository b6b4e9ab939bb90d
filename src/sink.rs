//! Object storage sinks
//!
//! The core hands a fully qualified key and an encoded payload to a single
//! `store` operation; everything about where the bytes land lives behind it.
//! A batch is stored at most once, after all in-memory work completes, so the
//! sink either writes the whole artifact or none of it.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::debug;

/// Storage abstraction consumed by the batch orchestration
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Persist `payload` at `key`, atomically
    async fn store(&self, key: &str, payload: Bytes) -> Result<()>;
}

/// Sink backed by an `object_store` implementation
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    /// Leading key segment to strip before handing the path to the store
    /// (S3 stores address the bucket out of band, but batch keys embed it)
    strip_prefix: Option<String>,
}

impl ObjectStoreSink {
    /// Wrap an existing object store
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            strip_prefix: None,
        }
    }

    /// S3 sink for `bucket`, credentials and region from the environment
    pub fn s3(bucket: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            strip_prefix: Some(format!("{bucket}/")),
        })
    }

    /// Local filesystem sink rooted at `root`
    pub fn local(root: &str) -> Result<Self> {
        std::fs::create_dir_all(root)
            .map_err(|e| Error::config(format!("Failed to create directory {root}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            strip_prefix: None,
        })
    }
}

#[async_trait]
impl ObjectSink for ObjectStoreSink {
    async fn store(&self, key: &str, payload: Bytes) -> Result<()> {
        let path = match &self.strip_prefix {
            Some(prefix) => key.strip_prefix(prefix).unwrap_or(key),
            None => key,
        };
        let path = ObjectPath::from(path);

        debug!(key = %path, bytes = payload.len(), "storing object");
        self.store.put(&path, payload.into()).await?;
        Ok(())
    }
}

/// In-memory sink for tests
#[derive(Default)]
pub struct MemorySink {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemorySink {
    /// Create an empty in-memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object by key
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .map(|objects| objects.get(key).cloned())
            .ok()
            .flatten()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectSink for MemorySink {
    async fn store(&self, key: &str, payload: Bytes) -> Result<()> {
        self.objects
            .lock()
            .map_err(|_| Error::Other("memory sink poisoned".to_string()))?
            .insert(key.to_string(), payload);
        Ok(())
    }
}
