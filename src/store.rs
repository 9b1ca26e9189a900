//! The legacy key-value substrate.
//!
//! Everything that predates the SQLite database lives here as string values
//! under well-known keys. Components receive a [`StoreHandle`] explicitly;
//! there is no process-global store.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::fs as async_fs;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read `{key}`: {message}")]
    Read { key: String, message: String },
    #[error("failed to write `{key}`: {message}")]
    Write { key: String, message: String },
    #[error("stored value for `{key}` is malformed: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn key(&self) -> &str {
        match self {
            StorageError::Read { key, .. }
            | StorageError::Write { key, .. }
            | StorageError::Decode { key, .. }
            | StorageError::Encode { key, .. } => key,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Async string-keyed blob storage.
///
/// Methods return boxed futures so implementations can sit behind
/// `Arc<dyn KeyValueStore>`.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<String>>>;
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, StorageResult<()>>;
    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<()>>;
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<String>>> {
        let value = self
            .data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned();
        async move { Ok(value) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        async move { Ok(()) }.boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        async move { Ok(()) }.boxed()
    }
}

/// A JSON object file holding every key. Loaded on first access and
/// rewritten atomically (temp file + rename) on every mutation.
pub struct FileStore {
    path: PathBuf,
    cache: tokio::sync::Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: tokio::sync::Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self, key: &str) -> StorageResult<BTreeMap<String, String>> {
        let raw = match async_fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    target: "sneakersecure",
                    event = "store_file_missing",
                    path = %self.path.display()
                );
                return Ok(BTreeMap::new());
            }
            Err(err) => {
                return Err(StorageError::Read {
                    key: key.to_string(),
                    message: format!("{}: {err}", self.path.display()),
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| {
            warn!(
                target: "sneakersecure",
                event = "store_file_malformed",
                path = %self.path.display(),
                error = %err
            );
            StorageError::Read {
                key: key.to_string(),
                message: format!("malformed store file {}: {err}", self.path.display()),
            }
        })
    }

    async fn persist(&self, map: &BTreeMap<String, String>, key: &str) -> StorageResult<()> {
        let write_err = |err: std::io::Error| StorageError::Write {
            key: key.to_string(),
            message: format!("{}: {err}", self.path.display()),
        };
        let body = serde_json::to_string_pretty(map).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        async_fs::write(&tmp, body).await.map_err(write_err)?;
        async_fs::rename(&tmp, &self.path).await.map_err(write_err)
    }

    async fn mutate<F>(&self, key: &str, apply: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut slot = self.cache.lock().await;
        if slot.is_none() {
            *slot = Some(self.read_file(key).await?);
        }
        let current = slot.get_or_insert_with(BTreeMap::new);
        let mut next = current.clone();
        apply(&mut next);
        // Only adopt the new map once it is on disk.
        self.persist(&next, key).await?;
        *current = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<String>>> {
        async move {
            let mut slot = self.cache.lock().await;
            if slot.is_none() {
                *slot = Some(self.read_file(key).await?);
            }
            Ok(slot.as_ref().and_then(|map| map.get(key).cloned()))
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        async move {
            self.mutate(key, |map| {
                map.insert(key.to_string(), value.to_string());
            })
            .await
        }
        .boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        async move {
            self.mutate(key, |map| {
                map.remove(key);
            })
            .await
        }
        .boxed()
    }
}

#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<dyn KeyValueStore>,
}

impl StoreHandle {
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::from_store(Arc::new(FileStore::new(path)))
    }

    pub fn from_store(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.set(key, value).await
    }

    pub async fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key).await
    }

    /// Like [`get`](Self::get), but an empty string reads as absent.
    pub async fn get_present(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.get(key).await?.filter(|value| !value.is_empty()))
    }

    /// Read and decode a JSON value. A missing or empty key is `Ok(None)`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get_present(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encode `value` as JSON and write it as a single blob.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &raw).await
    }
}
