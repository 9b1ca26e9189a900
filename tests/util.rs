#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use sneakersecure_lib::db::{CollectionDatabase, SqliteCollectionDb};
use sneakersecure_lib::model::CollectionItem;
use sneakersecure_lib::store::{
    KeyValueStore, MemoryStore, StorageError, StorageResult, StoreHandle,
};
use sneakersecure_lib::AppError;
use sqlx::sqlite::SqlitePoolOptions;

pub async fn memory_db() -> SqliteCollectionDb {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect sqlite::memory:");
    SqliteCollectionDb::new(pool)
}

/// In-memory substrate that records every access and can be told to fail
/// reads or writes of particular keys.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    ops: Mutex<Vec<String>>,
    failing_reads: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn handle(self: &Arc<Self>) -> StoreHandle {
        StoreHandle::from_store(self.clone())
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// True if any recorded operation targeted `key`.
    pub fn touched(&self, key: &str) -> bool {
        let suffix = format!(":{key}");
        self.ops().iter().any(|op| op.ends_with(&suffix))
    }

    pub fn fail_reads_of(&self, key: &str) {
        self.failing_reads.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_writes_of(&self, key: &str) {
        self.failing_writes.lock().unwrap().insert(key.to_string());
    }

    fn record(&self, op: &str, key: &str) {
        self.ops.lock().unwrap().push(format!("{op}:{key}"));
    }

    fn write_fails(&self, key: &str) -> bool {
        self.failing_writes.lock().unwrap().contains(key)
    }
}

impl KeyValueStore for RecordingStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<String>>> {
        self.record("get", key);
        if self.failing_reads.lock().unwrap().contains(key) {
            return future::ready(Err(StorageError::Read {
                key: key.to_string(),
                message: "injected read failure".into(),
            }))
            .boxed();
        }
        self.inner.get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        self.record("set", key);
        if self.write_fails(key) {
            return future::ready(Err(StorageError::Write {
                key: key.to_string(),
                message: "injected write failure".into(),
            }))
            .boxed();
        }
        self.inner.set(key, value)
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        self.record("remove", key);
        if self.write_fails(key) {
            return future::ready(Err(StorageError::Write {
                key: key.to_string(),
                message: "injected write failure".into(),
            }))
            .boxed();
        }
        self.inner.remove(key)
    }
}

/// Database double that keeps every batch it is asked to import.
#[derive(Default)]
pub struct RecordingDatabase {
    imports: Mutex<Vec<Vec<CollectionItem>>>,
    reject_imports: AtomicBool,
    panic_on_import: AtomicBool,
    init_error: Mutex<Option<AppError>>,
    init_calls: Mutex<u32>,
}

impl RecordingDatabase {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        let db = Self::default();
        db.reject_imports.store(true, Ordering::SeqCst);
        Arc::new(db)
    }

    pub fn failing_init(message: &str) -> Arc<Self> {
        let db = Self::default();
        *db.init_error.lock().unwrap() = Some(AppError::new("TEST/INIT", message));
        Arc::new(db)
    }

    pub fn panicking() -> Arc<Self> {
        let db = Self::default();
        db.panic_on_import.store(true, Ordering::SeqCst);
        Arc::new(db)
    }

    pub fn set_accepting(&self, accept: bool) {
        self.reject_imports.store(!accept, Ordering::SeqCst);
    }

    pub fn imports(&self) -> Vec<Vec<CollectionItem>> {
        self.imports.lock().unwrap().clone()
    }

    pub fn init_calls(&self) -> u32 {
        *self.init_calls.lock().unwrap()
    }
}

impl CollectionDatabase for RecordingDatabase {
    fn initialize(&self) -> BoxFuture<'_, Result<(), AppError>> {
        *self.init_calls.lock().unwrap() += 1;
        let result = match self.init_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        };
        future::ready(result).boxed()
    }

    fn bulk_import_collection<'a>(&'a self, records: &'a [CollectionItem]) -> BoxFuture<'a, bool> {
        if self.panic_on_import.load(Ordering::SeqCst) {
            panic!("import exploded");
        }
        self.imports.lock().unwrap().push(records.to_vec());
        future::ready(!self.reject_imports.load(Ordering::SeqCst)).boxed()
    }
}
