//! Error types of the in-memory file storage.
//!
//! These mirror the failures a hosted file storage reports: missing files,
//! refused access and an unreachable backend.

use std::fmt;

#[derive(Debug)]
pub enum StorageError {
    /// The file does not exist.
    FileNotFound {
        tenant: String,
        container: String,
        file_name: String,
    },

    /// The backend refused the operation.
    PermissionDenied { operation: String, resource: String },

    /// The backend could not be reached.
    Unavailable { message: String },

    /// Generic internal storage error.
    Internal { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::FileNotFound {
                tenant,
                container,
                file_name,
            } => write!(f, "File not found: {}/{}/{}", tenant, container, file_name),
            StorageError::PermissionDenied {
                operation,
                resource,
            } => write!(
                f,
                "Permission denied for operation '{}' on {}",
                operation, resource
            ),
            StorageError::Unavailable { message } => {
                write!(f, "Storage unavailable: {}", message)
            }
            StorageError::Internal { message } => write!(f, "Internal storage error: {}", message),
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    pub fn file_not_found(
        tenant: impl Into<String>,
        container: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self::FileNotFound {
            tenant: tenant.into(),
            container: container.into(),
            file_name: file_name.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn permission_denied(operation: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::PermissionDenied {
            operation: operation.into(),
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Transient failures may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StorageError::file_not_found("t", "asset", "u1.user.config.json");
        assert_eq!(err.to_string(), "File not found: t/asset/u1.user.config.json");

        let err = StorageError::unavailable("connection reset");
        assert_eq!(err.to_string(), "Storage unavailable: connection reset");
        assert!(err.is_transient());

        let err = StorageError::permission_denied("set", "t/asset/x");
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "Permission denied for operation 'set' on t/asset/x"
        );
    }
}
