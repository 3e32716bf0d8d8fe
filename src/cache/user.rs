//! Cache of per-user configuration files.

use crate::cache::FileCache;
use crate::error::AppResult;
use crate::model::UserStorageRecord;
use crate::storage::FileStorage;
use log::debug;
use std::sync::Arc;

/// File name suffix of user configuration files.
pub const USER_FILE_SUFFIX: &str = ".user.config.json";

/// Cache-coherent view of the users assigned to one application.
///
/// A user is assigned to an application exactly when the file
/// `"{user_id}.user.config.json"` exists in the application's container.
/// Lookups by id cost at most one existence check and one fetch. Lookups by
/// user name have no id to go on and reconcile the whole container first.
pub struct UserStorageCache<S> {
    files: FileCache<S, UserStorageRecord>,
}

impl<S: FileStorage> UserStorageCache<S> {
    pub fn new(storage: Arc<S>, tenant: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            files: FileCache::new(storage, tenant, container, USER_FILE_SUFFIX),
        }
    }

    /// Whether the user is cached. Never touches storage.
    pub fn has(&self, user_id: &str) -> bool {
        self.files.has(user_id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Cached user ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.files.ids()
    }

    /// Whether the user has a storage record, consulting the cache first.
    pub async fn exists_by_id(&mut self, user_id: &str) -> AppResult<bool> {
        self.files.exists_by_id(user_id).await
    }

    /// Whether any storage record carries `user_name`.
    pub async fn exists_by_user_name(&mut self, user_name: &str) -> AppResult<bool> {
        Ok(self.get_id_by_user_name(user_name).await?.is_some())
    }

    /// Id of the user whose record carries `user_name`.
    ///
    /// Every uncached file is fetched before matching, even when the user is
    /// already cached. With several matches the smallest id wins.
    pub async fn get_id_by_user_name(&mut self, user_name: &str) -> AppResult<Option<String>> {
        let added = self.files.fetch_missing().await?;
        debug!(
            "Looking up userName '{}' among {} users ({} newly fetched)",
            user_name,
            self.files.len(),
            added
        );

        Ok(self
            .files
            .entries()
            .into_iter()
            .find(|(_, record)| record.user_name == user_name)
            .map(|(id, _)| id.to_string()))
    }

    pub async fn get(&mut self, user_id: &str) -> AppResult<UserStorageRecord> {
        self.files.get(user_id).await
    }

    pub async fn set(&mut self, user_id: &str, record: UserStorageRecord) -> AppResult<()> {
        self.files.set(user_id, record).await
    }

    pub async fn delete(&mut self, user_id: &str) -> AppResult<()> {
        self.files.delete(user_id).await
    }

    /// Ids of user files in storage that are not cached yet.
    pub async fn missing_ids(&self) -> AppResult<Vec<String>> {
        self.files.missing_ids().await
    }

    /// Fetch every uncached user file; returns how many were added.
    pub async fn fetch_missing(&mut self) -> AppResult<usize> {
        self.files.fetch_missing().await
    }

    /// Every user record, after reconciling with storage.
    pub async fn fetch_all(&mut self) -> AppResult<Vec<(String, UserStorageRecord)>> {
        self.files.fetch_all().await
    }
}
