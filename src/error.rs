//! Error types for tenant application operations.
//!
//! Every failure surfaced by this crate is an [`AppError`]. Errors raised by
//! the lifecycle layer carry fixed, human-readable messages; errors raised by
//! the file storage or the identity directory are passed through untouched so
//! callers see the collaborator's own message.

use std::error::Error as StdError;

/// Machine-readable classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A lifecycle call was made before initialization completed.
    NotInitialized,
    /// The user has no storage record for this application.
    NotAssigned,
    /// A record or directory entry that should exist is missing.
    NotFound,
    /// The file storage or identity directory failed, or returned a
    /// document that could not be decoded.
    Collaborator,
    /// A required configuration field is structurally missing or malformed.
    Configuration,
}

/// Main error type for tenant application operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Application not initialized!")]
    NotInitialized,

    #[error("{message}")]
    NotAssigned { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Configuration { message: String },

    /// Failure reported by the file storage backend
    #[error(transparent)]
    Storage(Box<dyn StdError + Send + Sync>),

    /// Failure reported by the identity directory
    #[error(transparent)]
    Directory(Box<dyn StdError + Send + Sync>),

    /// A stored document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_assigned(message: impl Into<String>) -> Self {
        Self::NotAssigned {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a storage backend error without altering its message.
    pub fn storage<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Storage(Box::new(error))
    }

    /// Wrap an identity directory error without altering its message.
    pub fn directory<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Directory(Box::new(error))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotInitialized => ErrorKind::NotInitialized,
            AppError::NotAssigned { .. } => ErrorKind::NotAssigned,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Configuration { .. } => ErrorKind::Configuration,
            AppError::Storage(_) | AppError::Directory(_) | AppError::Json(_) => {
                ErrorKind::Collaborator
            }
        }
    }

    /// The human-readable message, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Lifecycle-level errors other than collaborator failures are not worth retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotInitialized | ErrorKind::Configuration)
    }
}

/// Result type for tenant application operations.
pub type AppResult<T> = Result<T, AppError>;
