//! File storage abstraction for application configuration files.
//!
//! Applications persist their state as JSON files in a hosted file storage,
//! addressed by storage tenant, container (the application's asset) and file
//! name. The [`FileStorage`] trait is the contract this crate consumes; the
//! hosted service client lives outside the crate and implements it.
//!
//! # Example Usage
//!
//! ```rust
//! use app_tenancy::storage::{FileKey, FileStorage, InMemoryFileStorage};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryFileStorage::new();
//! let key = FileKey::new("hosttenant", "asset1", "u1.user.config.json");
//!
//! storage.set(&key, json!({"userName": "alice"})).await?;
//! assert_eq!(storage.exists(&key).await?, Some(true));
//!
//! let names = storage
//!     .list_file_names("hosttenant", "asset1", ".user.config.json")
//!     .await?;
//! assert_eq!(names, vec!["u1.user.config.json".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

#[cfg(test)]
mod tests;

pub use errors::StorageError;
pub use in_memory::{InMemoryFileStorage, InMemoryFileStorageStats, StorageOperation};

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Location of a single file in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    tenant: String,
    container: String,
    file_name: String,
}

impl FileKey {
    pub fn new(
        tenant: impl Into<String>,
        container: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            container: container.into(),
            file_name: file_name.into(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.container, self.file_name)
    }
}

/// Contract for the hosted file storage.
///
/// Writes replace the whole file. Implementations must not cache: callers
/// layer their own cache on top and rely on every call reaching the backend.
pub trait FileStorage: Send + Sync {
    /// The error type returned by storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Names of all files in a container whose name ends with `suffix`.
    fn list_file_names(
        &self,
        tenant: &str,
        container: &str,
        suffix: &str,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    /// Whether the file exists.
    ///
    /// `None` means the backend could not tell; callers treat it as absent
    /// and must not cache the answer.
    fn exists(&self, key: &FileKey)
    -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send;

    /// File content, or `None` if there is no such file.
    fn get(&self, key: &FileKey) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Create or replace a file.
    fn set(&self, key: &FileKey, content: Value)
    -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete a file.
    fn delete(&self, key: &FileKey) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
