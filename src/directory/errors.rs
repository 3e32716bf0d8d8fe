//! Error types of the in-memory identity directory.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("User with id '{user_id}' not found in tenant '{tenant}'")]
    UserNotFound { tenant: String, user_id: String },

    #[error("Group with id '{group_id}' not found in tenant '{tenant}'")]
    GroupNotFound { tenant: String, group_id: String },

    #[error("User '{user_id}' is not a member of group '{group_id}'")]
    NotAMember { group_id: String, user_id: String },

    #[error("User with userName '{user_name}' already exists in tenant '{tenant}'")]
    DuplicateUserName { tenant: String, user_name: String },

    #[error("Identity directory unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal directory error: {message}")]
    Internal { message: String },
}

impl DirectoryError {
    pub fn user_not_found(tenant: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            tenant: tenant.into(),
            user_id: user_id.into(),
        }
    }

    pub fn group_not_found(tenant: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self::GroupNotFound {
            tenant: tenant.into(),
            group_id: group_id.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
