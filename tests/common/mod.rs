//! Shared fixtures for integration tests.
//!
//! Every fixture app lives in storage tenant `hosttenant`, container `asset1`
//! and manages users of tenant `tenant1`. The tenant's directory is seeded
//! with the six well-known groups and one unrelated group.

#![allow(dead_code)]

use app_tenancy::cache::USER_FILE_SUFFIX;
use app_tenancy::directory::InMemoryDirectory;
use app_tenancy::groups::WellKnownGroups;
use app_tenancy::model::{AppIdentity, Role, UserPermissions, UserStorageRecord};
use app_tenancy::storage::{FileKey, InMemoryFileStorage};
use app_tenancy::TenantApplication;
use serde_json::json;
use std::sync::Arc;

pub const STORAGE_TENANT: &str = "hosttenant";
pub const APP_ID: &str = "app1";
pub const ASSET_ID: &str = "asset1";
pub const TENANT: &str = "tenant1";
pub const SUBTENANT: &str = "subtenant2";

pub const GLOBAL_ADMIN: &str = "group-global-admin";
pub const GLOBAL_USER: &str = "group-global-user";
pub const LOCAL_ADMIN: &str = "group-local-admin";
pub const LOCAL_USER: &str = "group-local-user";
pub const STANDARD_USER: &str = "group-standard-user";
pub const SUBTENANT_USER: &str = "group-subtenant-user";
pub const UNRELATED: &str = "group-unrelated";

pub type TestApp = TenantApplication<InMemoryFileStorage, InMemoryDirectory>;

/// Install a test logger; honors `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn groups() -> WellKnownGroups {
    WellKnownGroups::new(
        GLOBAL_ADMIN,
        GLOBAL_USER,
        LOCAL_ADMIN,
        LOCAL_USER,
        STANDARD_USER,
        SUBTENANT_USER,
    )
}

pub fn identity(subtenant: Option<&str>) -> AppIdentity {
    let identity = AppIdentity::new(STORAGE_TENANT, APP_ID, ASSET_ID, TENANT);
    match subtenant {
        Some(subtenant) => identity.with_subtenant(subtenant),
        None => identity,
    }
}

pub fn user_key(user_id: &str) -> FileKey {
    FileKey::new(
        STORAGE_TENANT,
        ASSET_ID,
        format!("{}{}", user_id, USER_FILE_SUFFIX),
    )
}

pub fn record(user_name: &str, role: Role) -> UserStorageRecord {
    UserStorageRecord::new(user_name, UserPermissions::new(role))
}

/// A record with front-end payload, to check it is stored untouched.
pub fn rich_record(user_name: &str, role: Role) -> UserStorageRecord {
    let mut record = record(user_name, role);
    record
        .data
        .insert("plant-1".to_string(), json!({"dashboard": {"tiles": [1, 2, 3]}}));
    record
        .config
        .insert("plant-1".to_string(), json!({"notifications": false}));
    record
}

pub async fn seed_user_file(storage: &InMemoryFileStorage, user_id: &str, record: &UserStorageRecord) {
    storage
        .insert_out_of_band(
            &user_key(user_id),
            serde_json::to_value(record).expect("Failed to serialize user record"),
        )
        .await;
}

pub async fn seeded_directory() -> InMemoryDirectory {
    let directory = InMemoryDirectory::new();
    for (id, display) in [
        (GLOBAL_ADMIN, "Global Admins"),
        (GLOBAL_USER, "Global Users"),
        (LOCAL_ADMIN, "Local Admins"),
        (LOCAL_USER, "Local Users"),
        (STANDARD_USER, "Standard Users"),
        (SUBTENANT_USER, "Subtenant Users"),
        (UNRELATED, "Unrelated"),
    ] {
        directory.insert_group(TENANT, id, display).await;
    }
    directory
}

/// Collaborators and an app over them. Clones of the collaborators share
/// state with the ones the app holds.
pub struct Fixture {
    pub storage: InMemoryFileStorage,
    pub directory: InMemoryDirectory,
    pub app: TestApp,
}

impl Fixture {
    pub async fn new(subtenant: Option<&str>) -> Self {
        init_logging();
        let storage = InMemoryFileStorage::new();
        let directory = seeded_directory().await;
        let app = TenantApplication::new(
            identity(subtenant),
            groups(),
            Arc::new(storage.clone()),
            Arc::new(directory.clone()),
        );
        Self {
            storage,
            directory,
            app,
        }
    }

    /// Fixture with an initialized app and clean call statistics.
    pub async fn initialized(subtenant: Option<&str>) -> Self {
        let mut fixture = Self::new(subtenant).await;
        fixture
            .app
            .initialize()
            .await
            .expect("Failed to initialize app");
        fixture.reset_instrumentation();
        fixture
    }

    /// A second app over the same collaborators.
    pub fn sibling_app(&self, subtenant: Option<&str>) -> TestApp {
        TenantApplication::new(
            identity(subtenant),
            groups(),
            Arc::new(self.storage.clone()),
            Arc::new(self.directory.clone()),
        )
    }

    pub fn reset_instrumentation(&self) {
        self.storage.reset_stats();
        self.directory.clear_calls();
    }
}
