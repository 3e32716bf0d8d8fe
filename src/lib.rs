//! Tenant-scoped application user management for Rust.
//!
//! Manages the users, plants and settings of applications hosted for many
//! tenants on a cloud platform. Application data lives as JSON files in a
//! remote file storage; users and groups live in the tenant's identity
//! directory. This crate keeps write-through caches over the storage files
//! and keeps directory group membership in line with each user's role.
//!
//! # Core Components
//!
//! - [`TenantApplication`] - Per-tenant application: initialization and user lifecycle
//! - [`FileStorage`] - Trait for the remote file storage
//! - [`IdentityDirectory`] - Trait for the identity directory
//! - [`UserStorageCache`] - Lazy write-through cache of user records
//! - [`WellKnownGroups`] - Group-assignment rules
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use app_tenancy::{InMemoryDirectory, InMemoryFileStorage, TenantAppConfig, TenantApplication};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TenantAppConfig::from_file("tenant-app.json")?;
//! let mut app = TenantApplication::from_config(
//!     config,
//!     Arc::new(InMemoryFileStorage::new()),
//!     Arc::new(InMemoryDirectory::new()),
//! );
//! app.initialize().await?;
//! let exists = app.user_exists_in_tenant_and_storage("alice@example.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod groups;
pub mod model;
pub mod sampler;
pub mod storage;

// Re-export commonly used types for convenience
pub use app::{AppUser, TenantApplication};
pub use cache::{AppConfigCache, FileCache, UserStorageCache};
pub use config::{ConfigError, TenantAppConfig, TenantAppConfigBuilder};
pub use directory::{DirectoryError, IdentityDirectory, InMemoryDirectory};
pub use error::{AppError, AppResult, ErrorKind};
pub use groups::{GroupAssignment, MembershipPlan, WellKnownGroups};
pub use model::{
    AppIdentity, AppStorageRecord, PlantPermission, PlantStorageRecord, Role, UserPermissions,
    UserStorageRecord,
};
pub use sampler::{Sampler, TickHandler};
pub use storage::{FileKey, FileStorage, InMemoryFileStorage, StorageError};
