//! Tenant application orchestration.
//!
//! A [`TenantApplication`] manages the users, plants and settings of one
//! application installed for one tenant (or subtenant). It keeps three
//! caches over the application's files in storage and drives the identity
//! directory so that a user's directory groups follow the role recorded in
//! the user's storage record.
//!
//! # Example Usage
//!
//! ```rust
//! use app_tenancy::app::TenantApplication;
//! use app_tenancy::config::TenantAppConfig;
//! use app_tenancy::directory::InMemoryDirectory;
//! use app_tenancy::model::{Role, UserPermissions, UserStorageRecord};
//! use app_tenancy::storage::InMemoryFileStorage;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TenantAppConfig::builder("hosttenant", "app1", "asset1", "tenant1")
//!     .with_groups("ga", "gu", "la", "lu", "std", "sub")
//!     .build()?;
//! let directory = InMemoryDirectory::new();
//! for group in ["ga", "gu", "la", "lu", "std", "sub"] {
//!     directory.insert_group("tenant1", group, group).await;
//! }
//!
//! let mut app = TenantApplication::from_config(
//!     config,
//!     Arc::new(InMemoryFileStorage::new()),
//!     Arc::new(directory),
//! );
//! app.initialize().await?;
//!
//! let record = UserStorageRecord::new("alice@example.com", UserPermissions::new(Role::LocalUser));
//! let user = app.create_user(record).await?;
//! assert!(app.user_assigned_to_app(&user.directory.id).await?);
//! # Ok(())
//! # }
//! ```

mod plants;
mod users;

use crate::cache::{AppConfigCache, FileCache, PLANT_FILE_SUFFIX, UserStorageCache};
use crate::config::TenantAppConfig;
use crate::directory::{DirectoryUser, IdentityDirectory};
use crate::error::{AppError, AppResult};
use crate::groups::WellKnownGroups;
use crate::model::{AppIdentity, PlantStorageRecord, UserStorageRecord};
use crate::storage::FileStorage;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// A user as seen by the application: its directory entry and its storage record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppUser {
    #[serde(rename = "msData")]
    pub directory: DirectoryUser,
    #[serde(rename = "storageData")]
    pub storage: UserStorageRecord,
}

/// One application of one tenant.
///
/// Methods that may populate a cache take `&mut self`: an instance serves
/// one caller at a time and its caches need no locking. Instances sharing the
/// same storage and directory are not kept consistent with each other.
pub struct TenantApplication<S, D> {
    identity: AppIdentity,
    groups: WellKnownGroups,
    directory: Arc<D>,
    users: UserStorageCache<S>,
    plants: FileCache<S, PlantStorageRecord>,
    app_config: AppConfigCache<S>,
    initialized: bool,
}

impl<S, D> TenantApplication<S, D>
where
    S: FileStorage,
    D: IdentityDirectory,
{
    pub fn new(
        identity: AppIdentity,
        groups: WellKnownGroups,
        storage: Arc<S>,
        directory: Arc<D>,
    ) -> Self {
        let tenant = identity.storage_tenant.clone();
        let container = identity.container().to_string();

        Self {
            users: UserStorageCache::new(Arc::clone(&storage), &tenant, &container),
            plants: FileCache::new(Arc::clone(&storage), &tenant, &container, PLANT_FILE_SUFFIX),
            app_config: AppConfigCache::new(storage, tenant, container),
            identity,
            groups,
            directory,
            initialized: false,
        }
    }

    pub fn from_config(config: TenantAppConfig, storage: Arc<S>, directory: Arc<D>) -> Self {
        Self::new(config.identity, config.groups, storage, directory)
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    pub fn groups(&self) -> &WellKnownGroups {
        &self.groups
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_subtenant_app(&self) -> bool {
        self.identity.is_subtenant_app()
    }

    /// Read-only view of the user cache.
    pub fn user_cache(&self) -> &UserStorageCache<S> {
        &self.users
    }

    fn ensure_initialized(&self) -> AppResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(AppError::NotInitialized)
        }
    }

    /// Load the app config and warm the plant and user caches.
    ///
    /// Initialization happens once; later calls return immediately.
    pub async fn initialize(&mut self) -> AppResult<()> {
        if self.initialized {
            debug!("App '{}' already initialized", self.identity.app_id);
            return Ok(());
        }

        info!(
            "Initializing app '{}' of tenant '{}' (subtenant: {:?})",
            self.identity.app_id, self.identity.app_tenant, self.identity.subtenant_id
        );
        self.app_config.load().await?;
        let plants = self.plants.fetch_missing().await?;
        let users = self.users.fetch_missing().await?;

        self.initialized = true;
        info!(
            "App '{}' initialized with {} plants and {} users",
            self.identity.app_id, plants, users
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::error::ErrorKind;
    use crate::storage::{FileKey, InMemoryFileStorage, StorageOperation};
    use serde_json::json;

    fn app(
        storage: &InMemoryFileStorage,
    ) -> TenantApplication<InMemoryFileStorage, InMemoryDirectory> {
        TenantApplication::new(
            AppIdentity::new("hosttenant", "app1", "asset1", "tenant1"),
            WellKnownGroups::new("ga", "gu", "la", "lu", "std", "sub"),
            Arc::new(storage.clone()),
            Arc::new(InMemoryDirectory::new()),
        )
    }

    #[tokio::test]
    async fn test_initialize_warms_caches() {
        let storage = InMemoryFileStorage::new();
        storage
            .insert_out_of_band(
                &FileKey::new("hosttenant", "asset1", "u1.user.config.json"),
                json!({"userName": "alice", "permissions": {"role": "localUser"}}),
            )
            .await;
        storage
            .insert_out_of_band(
                &FileKey::new("hosttenant", "asset1", "p1.plant.config.json"),
                json!({"data": {}, "config": {}}),
            )
            .await;

        let mut app = app(&storage);
        assert!(!app.is_initialized());
        app.initialize().await.unwrap();

        assert!(app.is_initialized());
        assert!(app.user_cache().has("u1"));

        // A second call is a no-op
        storage.reset_stats();
        app.initialize().await.unwrap();
        assert_eq!(storage.stats().total_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_initialization_stays_uninitialized() {
        let storage = InMemoryFileStorage::new();
        let mut app = app(&storage);

        storage.fail_next(StorageOperation::List);
        let err = app.initialize().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert!(!app.is_initialized());

        app.initialize().await.unwrap();
        assert!(app.is_initialized());
    }

    #[test]
    fn test_app_user_wire_names() {
        let user = AppUser {
            directory: DirectoryUser::new("u1", "alice"),
            storage: UserStorageRecord::new(
                "alice",
                crate::model::UserPermissions::new(crate::model::Role::LocalUser),
            ),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["msData"]["id"], "u1");
        assert_eq!(value["storageData"]["userName"], "alice");
    }
}
