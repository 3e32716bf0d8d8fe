//! Identity directory abstraction.
//!
//! Users and groups of a tenant are owned by the platform's identity
//! service. The [`IdentityDirectory`] trait lists the calls this crate makes
//! against it; the documents exchanged follow the platform's SCIM-style user
//! and group shapes.
//!
//! # Example Usage
//!
//! ```rust
//! use app_tenancy::directory::{IdentityDirectory, InMemoryDirectory, NewDirectoryUser, UserFilter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new();
//! let created = directory
//!     .create_user("tenant1", NewDirectoryUser::new("alice@example.com"))
//!     .await?;
//!
//! let found = directory
//!     .list_users("tenant1", &UserFilter::new().with_user_name("alice@example.com"))
//!     .await?;
//! assert_eq!(found[0].id, created.id);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::DirectoryError;
pub use in_memory::{DirectoryCall, DirectoryOperation, InMemoryDirectory};

use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubtenantRef {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    Direct,
    Indirect,
}

/// A group the user belongs to, as listed on the user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub display: String,
    #[serde(rename = "type")]
    pub membership: MembershipType,
    /// Group id
    pub value: String,
}

impl GroupRef {
    pub fn direct(display: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            membership: MembershipType::Direct,
            value: group_id.into(),
        }
    }
}

/// A user of the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    pub user_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub name: PersonName,
    #[serde(default)]
    pub subtenants: Vec<SubtenantRef>,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
}

impl DirectoryUser {
    pub fn new(id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            active: true,
            name: PersonName::default(),
            subtenants: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_subtenant(mut self, subtenant_id: impl Into<String>) -> Self {
        self.subtenants.push(SubtenantRef {
            id: subtenant_id.into(),
        });
        self
    }

    pub fn has_subtenant(&self, subtenant_id: &str) -> bool {
        self.subtenants.iter().any(|s| s.id == subtenant_id)
    }

    pub fn is_member_of(&self, group_id: &str) -> bool {
        self.groups.iter().any(|g| g.value == group_id)
    }
}

/// Payload for creating a directory user; the directory generates the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDirectoryUser {
    pub user_name: String,
    pub active: bool,
    pub name: PersonName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtenants: Option<Vec<SubtenantRef>>,
}

impl NewDirectoryUser {
    /// An active user with an empty name.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            active: true,
            name: PersonName::default(),
            subtenants: None,
        }
    }

    pub fn with_subtenant(mut self, subtenant_id: impl Into<String>) -> Self {
        self.subtenants = Some(vec![SubtenantRef {
            id: subtenant_id.into(),
        }]);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryGroup {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    User,
    Group,
}

/// Direct member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "type")]
    pub member_type: MemberType,
    /// User or group id
    pub value: String,
}

impl GroupMember {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            member_type: MemberType::User,
            value: user_id.into(),
        }
    }

    pub fn is_user(&self, user_id: &str) -> bool {
        self.member_type == MemberType::User && self.value == user_id
    }
}

/// Filter for listing directory users. Unset fields do not filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilter {
    pub subtenant: Option<String>,
    pub group: Option<String>,
    pub user_name: Option<String>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subtenant(mut self, subtenant: impl Into<String>) -> Self {
        self.subtenant = Some(subtenant.into());
        self
    }

    /// Set the subtenant filter only when one is given.
    pub fn with_optional_subtenant(mut self, subtenant: Option<&str>) -> Self {
        self.subtenant = subtenant.map(str::to_string);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

/// Contract for the identity directory of the platform.
///
/// All calls are scoped by tenant. Implementations report failures through
/// their own error type; callers pass those errors on unchanged.
pub trait IdentityDirectory: Send + Sync {
    /// The error type returned by directory operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Users of a tenant matching every set field of `filter`.
    fn list_users(
        &self,
        tenant: &str,
        filter: &UserFilter,
    ) -> impl Future<Output = Result<Vec<DirectoryUser>, Self::Error>> + Send;

    /// Whether a user with `user_name` exists, optionally within a subtenant.
    fn user_exists(
        &self,
        tenant: &str,
        subtenant: Option<&str>,
        user_name: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// A user by id, or `None` if the tenant has no such user.
    fn get_user(
        &self,
        tenant: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<DirectoryUser>, Self::Error>> + Send;

    /// Create a user and return it with its generated id.
    fn create_user(
        &self,
        tenant: &str,
        user: NewDirectoryUser,
    ) -> impl Future<Output = Result<DirectoryUser, Self::Error>> + Send;

    fn delete_user(
        &self,
        tenant: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn list_groups(
        &self,
        tenant: &str,
    ) -> impl Future<Output = Result<Vec<DirectoryGroup>, Self::Error>> + Send;

    /// Direct members of a group.
    fn get_group_members(
        &self,
        tenant: &str,
        group_id: &str,
    ) -> impl Future<Output = Result<Vec<GroupMember>, Self::Error>> + Send;

    fn add_user_to_group(
        &self,
        tenant: &str,
        group_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn remove_user_from_group(
        &self,
        tenant: &str,
        group_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
