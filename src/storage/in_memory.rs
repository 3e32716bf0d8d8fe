//! In-memory file storage.
//!
//! A thread-safe implementation of [`FileStorage`] backed by nested hash
//! maps, for development and tests. Besides storing files it counts every
//! call per operation and can be told to fail the next call of an operation,
//! which lets callers observe exactly how a cache layered on top talks to
//! storage.
//!
//! # Example Usage
//!
//! ```rust
//! use app_tenancy::storage::{FileKey, FileStorage, InMemoryFileStorage, StorageOperation};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryFileStorage::new();
//! let key = FileKey::new("t", "asset", "u1.user.config.json");
//!
//! storage.fail_next(StorageOperation::Set);
//! assert!(storage.set(&key, json!({})).await.is_err());
//! storage.set(&key, json!({})).await?;
//!
//! assert_eq!(storage.stats().set_calls, 2);
//! # Ok(())
//! # }
//! ```

use crate::storage::{FileKey, FileStorage, StorageError};
use log::trace;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Storage operations, used for call statistics and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOperation {
    List,
    Exists,
    Get,
    Set,
    Delete,
}

/// Number of calls received per operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryFileStorageStats {
    pub list_calls: usize,
    pub exists_calls: usize,
    pub get_calls: usize,
    pub set_calls: usize,
    pub delete_calls: usize,
}

impl InMemoryFileStorageStats {
    pub fn total_calls(&self) -> usize {
        self.list_calls + self.exists_calls + self.get_calls + self.set_calls + self.delete_calls
    }
}

#[derive(Debug, Default)]
struct Instrumentation {
    stats: InMemoryFileStorageStats,
    fail_next: HashSet<StorageOperation>,
    existence_unknown: bool,
}

/// Thread-safe in-memory file storage.
///
/// Files are kept as `tenant` → `container` → `file_name` → content. Clones
/// share the same files and the same instrumentation.
#[derive(Clone, Default)]
pub struct InMemoryFileStorage {
    files: Arc<RwLock<HashMap<String, HashMap<String, HashMap<String, Value>>>>>,
    instrumentation: Arc<Mutex<Instrumentation>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> InMemoryFileStorageStats {
        self.instrumentation
            .lock()
            .map(|guard| guard.stats.clone())
            .unwrap_or_default()
    }

    pub fn reset_stats(&self) {
        if let Ok(mut guard) = self.instrumentation.lock() {
            guard.stats = InMemoryFileStorageStats::default();
        }
    }

    /// Make the next call of `operation` fail with [`StorageError::Unavailable`].
    pub fn fail_next(&self, operation: StorageOperation) {
        if let Ok(mut guard) = self.instrumentation.lock() {
            guard.fail_next.insert(operation);
        }
    }

    /// Make `exists` answer `None` until switched back.
    pub fn set_existence_unknown(&self, unknown: bool) {
        if let Ok(mut guard) = self.instrumentation.lock() {
            guard.existence_unknown = unknown;
        }
    }

    /// Write a file without going through [`FileStorage`], as another
    /// process sharing the storage would. Not counted in the statistics.
    pub async fn insert_out_of_band(&self, key: &FileKey, content: Value) {
        let mut files = self.files.write().await;
        files
            .entry(key.tenant().to_string())
            .or_default()
            .entry(key.container().to_string())
            .or_default()
            .insert(key.file_name().to_string(), content);
    }

    /// Remove a file without going through [`FileStorage`]. Not counted.
    pub async fn remove_out_of_band(&self, key: &FileKey) -> bool {
        let mut files = self.files.write().await;
        files
            .get_mut(key.tenant())
            .and_then(|containers| containers.get_mut(key.container()))
            .and_then(|container| container.remove(key.file_name()))
            .is_some()
    }

    /// Read a file without going through [`FileStorage`]. Not counted.
    pub async fn peek(&self, key: &FileKey) -> Option<Value> {
        let files = self.files.read().await;
        Self::lookup(&files, key).cloned()
    }

    /// Number of files in a container.
    pub async fn file_count(&self, tenant: &str, container: &str) -> usize {
        let files = self.files.read().await;
        files
            .get(tenant)
            .and_then(|containers| containers.get(container))
            .map(|container| container.len())
            .unwrap_or(0)
    }

    /// Remove every file and reset the instrumentation.
    pub async fn clear(&self) {
        self.files.write().await.clear();
        if let Ok(mut guard) = self.instrumentation.lock() {
            *guard = Instrumentation::default();
        }
    }

    fn lookup<'a>(
        files: &'a HashMap<String, HashMap<String, HashMap<String, Value>>>,
        key: &FileKey,
    ) -> Option<&'a Value> {
        files
            .get(key.tenant())
            .and_then(|containers| containers.get(key.container()))
            .and_then(|container| container.get(key.file_name()))
    }

    /// Count the call and consume an injected failure, if any.
    fn record(&self, operation: StorageOperation) -> Result<(), StorageError> {
        let mut guard = self
            .instrumentation
            .lock()
            .map_err(|_| StorageError::internal("instrumentation lock poisoned"))?;

        let stats = &mut guard.stats;
        match operation {
            StorageOperation::List => stats.list_calls += 1,
            StorageOperation::Exists => stats.exists_calls += 1,
            StorageOperation::Get => stats.get_calls += 1,
            StorageOperation::Set => stats.set_calls += 1,
            StorageOperation::Delete => stats.delete_calls += 1,
        }

        if guard.fail_next.remove(&operation) {
            return Err(StorageError::unavailable(format!(
                "injected failure for {:?}",
                operation
            )));
        }
        Ok(())
    }

    fn existence_unknown(&self) -> bool {
        self.instrumentation
            .lock()
            .map(|guard| guard.existence_unknown)
            .unwrap_or(false)
    }
}

impl FileStorage for InMemoryFileStorage {
    type Error = StorageError;

    async fn list_file_names(
        &self,
        tenant: &str,
        container: &str,
        suffix: &str,
    ) -> Result<Vec<String>, Self::Error> {
        self.record(StorageOperation::List)?;
        let files = self.files.read().await;

        let mut names: Vec<String> = files
            .get(tenant)
            .and_then(|containers| containers.get(container))
            .map(|container| {
                container
                    .keys()
                    .filter(|name| name.ends_with(suffix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Consistent ordering for callers and tests
        names.sort();
        trace!("Listed {} files in {}/{}", names.len(), tenant, container);
        Ok(names)
    }

    async fn exists(&self, key: &FileKey) -> Result<Option<bool>, Self::Error> {
        self.record(StorageOperation::Exists)?;
        if self.existence_unknown() {
            return Ok(None);
        }
        let files = self.files.read().await;
        Ok(Some(Self::lookup(&files, key).is_some()))
    }

    async fn get(&self, key: &FileKey) -> Result<Option<Value>, Self::Error> {
        self.record(StorageOperation::Get)?;
        let files = self.files.read().await;
        Ok(Self::lookup(&files, key).cloned())
    }

    async fn set(&self, key: &FileKey, content: Value) -> Result<(), Self::Error> {
        self.record(StorageOperation::Set)?;
        self.insert_out_of_band(key, content).await;
        Ok(())
    }

    async fn delete(&self, key: &FileKey) -> Result<(), Self::Error> {
        self.record(StorageOperation::Delete)?;
        if self.remove_out_of_band(key).await {
            Ok(())
        } else {
            Err(StorageError::file_not_found(
                key.tenant(),
                key.container(),
                key.file_name(),
            ))
        }
    }
}
