//! Write-through caches over application files in storage.
//!
//! Reading a configuration file from the hosted storage on every request is
//! slow, so each application keeps the files it has seen in memory. The
//! caches here share one discipline:
//!
//! * entries are inserted lazily, when a read misses the cache and finds the
//!   file in storage, and are removed only by an explicit delete
//! * negative answers are never cached; a miss always asks storage again
//! * writes and deletes reach storage first and touch the cache only after
//!   storage reported success
//!
//! Nothing expires: in normal operation this process is the only writer of
//! its application's files, and the reconciliation scan in
//! [`FileCache::fetch_missing`] picks up files written by anyone else.

pub mod app_config;
pub mod user;

pub use app_config::{AppConfigCache, APP_CONFIG_FILE_NAME};
pub use user::{USER_FILE_SUFFIX, UserStorageCache};

use crate::error::{AppError, AppResult};
use crate::storage::{FileKey, FileStorage};
use log::{debug, trace, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// File name suffix of plant configuration files.
pub const PLANT_FILE_SUFFIX: &str = ".plant.config.json";

/// Lazily populated cache of the files `"{id}{suffix}"` in one container.
pub struct FileCache<S, T> {
    storage: Arc<S>,
    tenant: String,
    container: String,
    suffix: String,
    entries: HashMap<String, T>,
}

impl<S, T> FileCache<S, T>
where
    S: FileStorage,
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(
        storage: Arc<S>,
        tenant: impl Into<String>,
        container: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            tenant: tenant.into(),
            container: container.into(),
            suffix: suffix.into(),
            entries: HashMap::new(),
        }
    }

    pub fn file_name(&self, id: &str) -> String {
        format!("{}{}", id, self.suffix)
    }

    fn key(&self, id: &str) -> FileKey {
        FileKey::new(&self.tenant, &self.container, self.file_name(id))
    }

    fn id_from_file_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name.strip_suffix(self.suffix.as_str())
    }

    /// Whether `id` is cached. Never touches storage.
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Cached `(id, record)` pairs sorted by id.
    pub fn entries(&self) -> Vec<(&str, &T)> {
        let mut entries: Vec<(&str, &T)> = self
            .entries
            .iter()
            .map(|(id, record)| (id.as_str(), record))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    async fn fetch(&self, id: &str) -> AppResult<Option<T>> {
        let key = self.key(id);
        let content = self.storage.get(&key).await.map_err(AppError::storage)?;
        match content {
            Some(value) => {
                trace!("Fetched {}", key);
                Ok(Some(serde_json::from_value(value)?))
            }
            None => Ok(None),
        }
    }

    /// Whether the file for `id` exists, consulting the cache first.
    ///
    /// On a miss this performs one existence check and, when the file is
    /// there, one fetch whose result is cached. An absent or unknown answer
    /// caches nothing.
    pub async fn exists_by_id(&mut self, id: &str) -> AppResult<bool> {
        if self.has(id) {
            return Ok(true);
        }

        let key = self.key(id);
        debug!("Cache miss for {}, checking storage", key);
        let exists = self
            .storage
            .exists(&key)
            .await
            .map_err(AppError::storage)?;
        if exists != Some(true) {
            return Ok(false);
        }

        match self.fetch(id).await? {
            Some(record) => {
                self.entries.insert(id.to_string(), record);
                Ok(true)
            }
            None => {
                warn!("{} vanished between existence check and fetch", key);
                Ok(false)
            }
        }
    }

    /// The record for `id`, fetched and cached on a miss.
    pub async fn get(&mut self, id: &str) -> AppResult<T> {
        if let Some(record) = self.entries.get(id) {
            return Ok(record.clone());
        }

        debug!("Cache miss for {}, fetching", self.key(id));
        match self.fetch(id).await? {
            Some(record) => {
                self.entries.insert(id.to_string(), record.clone());
                Ok(record)
            }
            None => Err(AppError::not_found(format!(
                "File {} not found!",
                self.file_name(id)
            ))),
        }
    }

    /// Write the record to storage, then cache it.
    pub async fn set(&mut self, id: &str, record: T) -> AppResult<()> {
        let content = serde_json::to_value(&record)?;
        self.storage
            .set(&self.key(id), content)
            .await
            .map_err(AppError::storage)?;
        self.entries.insert(id.to_string(), record);
        Ok(())
    }

    /// Delete the file from storage, then drop it from the cache.
    pub async fn delete(&mut self, id: &str) -> AppResult<()> {
        self.storage
            .delete(&self.key(id))
            .await
            .map_err(AppError::storage)?;
        self.entries.remove(id);
        Ok(())
    }

    /// Ids of files present in storage but not cached, sorted.
    pub async fn missing_ids(&self) -> AppResult<Vec<String>> {
        let names = self
            .storage
            .list_file_names(&self.tenant, &self.container, &self.suffix)
            .await
            .map_err(AppError::storage)?;

        let mut missing: Vec<String> = names
            .iter()
            .filter_map(|name| self.id_from_file_name(name))
            .filter(|id| !self.entries.contains_key(*id))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        Ok(missing)
    }

    /// Fetch and cache every file that storage has and the cache lacks.
    ///
    /// Files are fetched one after another; on failure the records fetched
    /// so far stay cached. Returns the number of records added.
    pub async fn fetch_missing(&mut self) -> AppResult<usize> {
        let missing = self.missing_ids().await?;
        let mut added = 0;

        for id in missing {
            match self.fetch(&id).await? {
                Some(record) => {
                    self.entries.insert(id, record);
                    added += 1;
                }
                None => warn!("{} was listed but could not be fetched", self.key(&id)),
            }
        }

        debug!(
            "Reconciled {}/{}: {} added, {} cached",
            self.container,
            self.suffix,
            added,
            self.entries.len()
        );
        Ok(added)
    }

    /// Reconcile with storage and return every record, sorted by id.
    pub async fn fetch_all(&mut self) -> AppResult<Vec<(String, T)>> {
        self.fetch_missing().await?;
        Ok(self
            .entries()
            .into_iter()
            .map(|(id, record)| (id.to_string(), record.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlantStorageRecord;
    use crate::storage::{InMemoryFileStorage, StorageOperation};
    use serde_json::json;

    fn plant_cache(storage: &InMemoryFileStorage) -> FileCache<InMemoryFileStorage, PlantStorageRecord> {
        FileCache::new(
            Arc::new(storage.clone()),
            "hosttenant",
            "asset1",
            PLANT_FILE_SUFFIX,
        )
    }

    fn plant_key(id: &str) -> FileKey {
        FileKey::new("hosttenant", "asset1", format!("{}{}", id, PLANT_FILE_SUFFIX))
    }

    #[tokio::test]
    async fn test_get_caches_on_miss() {
        let storage = InMemoryFileStorage::new();
        storage
            .insert_out_of_band(&plant_key("p1"), json!({"data": {"name": "Plant 1"}}))
            .await;
        let mut cache = plant_cache(&storage);

        let record = cache.get("p1").await.unwrap();
        assert_eq!(record.data["name"], "Plant 1");
        assert!(cache.has("p1"));

        cache.get("p1").await.unwrap();
        assert_eq!(storage.stats().get_calls, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let storage = InMemoryFileStorage::new();
        let mut cache = plant_cache(&storage);

        let err = cache.get("nope").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert!(!cache.has("nope"));
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_entry() {
        let storage = InMemoryFileStorage::new();
        let mut cache = plant_cache(&storage);
        cache.set("p1", PlantStorageRecord::default()).await.unwrap();

        storage.fail_next(StorageOperation::Delete);
        assert!(cache.delete("p1").await.is_err());
        assert!(cache.has("p1"));

        cache.delete("p1").await.unwrap();
        assert!(!cache.has("p1"));
        assert!(storage.peek(&plant_key("p1")).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_missing_keeps_partial_progress() {
        let storage = InMemoryFileStorage::new();
        storage.insert_out_of_band(&plant_key("p1"), json!({})).await;
        // Not a plant record, fails to deserialize
        storage
            .insert_out_of_band(&plant_key("p2"), json!("garbage"))
            .await;
        storage.insert_out_of_band(&plant_key("p3"), json!({})).await;
        let mut cache = plant_cache(&storage);

        assert_eq!(cache.missing_ids().await.unwrap(), vec!["p1", "p2", "p3"]);

        assert!(cache.fetch_missing().await.is_err());
        assert_eq!(cache.ids(), vec!["p1"]);

        storage.insert_out_of_band(&plant_key("p2"), json!({})).await;
        assert_eq!(cache.fetch_missing().await.unwrap(), 2);
        assert_eq!(cache.ids(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_listing_failure_leaves_cache_untouched() {
        let storage = InMemoryFileStorage::new();
        storage.insert_out_of_band(&plant_key("p1"), json!({})).await;
        let mut cache = plant_cache(&storage);

        storage.fail_next(StorageOperation::List);
        assert!(cache.fetch_missing().await.is_err());
        assert!(cache.is_empty());
        assert_eq!(storage.stats().get_calls, 0);
    }

    #[tokio::test]
    async fn test_fetch_all_ignores_other_suffixes() {
        let storage = InMemoryFileStorage::new();
        storage.insert_out_of_band(&plant_key("p1"), json!({})).await;
        storage
            .insert_out_of_band(
                &FileKey::new("hosttenant", "asset1", "u1.user.config.json"),
                json!({}),
            )
            .await;
        let mut cache = plant_cache(&storage);

        let all = cache.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "p1");
    }
}
