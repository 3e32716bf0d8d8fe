//! In-memory identity directory.
//!
//! Implements [`IdentityDirectory`] over per-tenant maps of users, groups and
//! group members. Every call made through the trait is appended to a call
//! log and any operation can be made to fail once, so orchestration code can
//! be checked for the exact sequence of directory calls it issues.
//!
//! Setup helpers (`insert_user`, `insert_group`, `insert_member`, ...) change
//! the directory without being logged, the way an administrator working in
//! the platform console would.

use crate::directory::{
    DirectoryError, DirectoryGroup, DirectoryUser, GroupMember, IdentityDirectory,
    NewDirectoryUser, UserFilter,
};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOperation {
    ListUsers,
    UserExists,
    GetUser,
    CreateUser,
    DeleteUser,
    ListGroups,
    GetGroupMembers,
    AddUserToGroup,
    RemoveUserFromGroup,
}

/// A call received through [`IdentityDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    ListUsers { tenant: String, filter: UserFilter },
    UserExists { tenant: String, subtenant: Option<String>, user_name: String },
    GetUser { tenant: String, user_id: String },
    CreateUser { tenant: String, user: NewDirectoryUser },
    DeleteUser { tenant: String, user_id: String },
    ListGroups { tenant: String },
    GetGroupMembers { tenant: String, group_id: String },
    AddUserToGroup { tenant: String, group_id: String, user_id: String },
    RemoveUserFromGroup { tenant: String, group_id: String, user_id: String },
}

impl DirectoryCall {
    pub fn operation(&self) -> DirectoryOperation {
        match self {
            DirectoryCall::ListUsers { .. } => DirectoryOperation::ListUsers,
            DirectoryCall::UserExists { .. } => DirectoryOperation::UserExists,
            DirectoryCall::GetUser { .. } => DirectoryOperation::GetUser,
            DirectoryCall::CreateUser { .. } => DirectoryOperation::CreateUser,
            DirectoryCall::DeleteUser { .. } => DirectoryOperation::DeleteUser,
            DirectoryCall::ListGroups { .. } => DirectoryOperation::ListGroups,
            DirectoryCall::GetGroupMembers { .. } => DirectoryOperation::GetGroupMembers,
            DirectoryCall::AddUserToGroup { .. } => DirectoryOperation::AddUserToGroup,
            DirectoryCall::RemoveUserFromGroup { .. } => DirectoryOperation::RemoveUserFromGroup,
        }
    }

    /// Whether the call changes directory state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self.operation(),
            DirectoryOperation::CreateUser
                | DirectoryOperation::DeleteUser
                | DirectoryOperation::AddUserToGroup
                | DirectoryOperation::RemoveUserFromGroup
        )
    }
}

#[derive(Debug, Default)]
struct TenantDirectory {
    users: HashMap<String, DirectoryUser>,
    groups: HashMap<String, DirectoryGroup>,
    members: HashMap<String, Vec<GroupMember>>,
}

#[derive(Debug, Default)]
struct CallLog {
    calls: Vec<DirectoryCall>,
    fail_next: HashSet<DirectoryOperation>,
}

/// Thread-safe in-memory identity directory. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    tenants: Arc<RwLock<HashMap<String, TenantDirectory>>>,
    log: Arc<Mutex<CallLog>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user without logging the call.
    pub async fn insert_user(&self, tenant: &str, user: DirectoryUser) {
        let mut tenants = self.tenants.write().await;
        tenants
            .entry(tenant.to_string())
            .or_default()
            .users
            .insert(user.id.clone(), user);
    }

    /// Remove a user and its memberships without logging the call.
    pub async fn remove_user(&self, tenant: &str, user_id: &str) -> bool {
        let mut tenants = self.tenants.write().await;
        match tenants.get_mut(tenant) {
            Some(directory) => {
                for members in directory.members.values_mut() {
                    members.retain(|m| !m.is_user(user_id));
                }
                directory.users.remove(user_id).is_some()
            }
            None => false,
        }
    }

    /// Add or replace a group without logging the call.
    pub async fn insert_group(&self, tenant: &str, group_id: &str, display_name: &str) {
        let mut tenants = self.tenants.write().await;
        let directory = tenants.entry(tenant.to_string()).or_default();
        directory.groups.insert(
            group_id.to_string(),
            DirectoryGroup {
                id: group_id.to_string(),
                display_name: display_name.to_string(),
                description: None,
            },
        );
        directory.members.entry(group_id.to_string()).or_default();
    }

    /// Add a user to a group without logging the call.
    pub async fn insert_member(&self, tenant: &str, group_id: &str, user_id: &str) {
        let mut tenants = self.tenants.write().await;
        let members = tenants
            .entry(tenant.to_string())
            .or_default()
            .members
            .entry(group_id.to_string())
            .or_default();
        if !members.iter().any(|m| m.is_user(user_id)) {
            members.push(GroupMember::user(user_id));
        }
    }

    /// Ids of the groups `user_id` is a direct member of, sorted.
    pub async fn groups_of(&self, tenant: &str, user_id: &str) -> Vec<String> {
        let tenants = self.tenants.read().await;
        let mut groups: Vec<String> = tenants
            .get(tenant)
            .map(|directory| {
                directory
                    .members
                    .iter()
                    .filter(|(_, members)| members.iter().any(|m| m.is_user(user_id)))
                    .map(|(group_id, _)| group_id.clone())
                    .collect()
            })
            .unwrap_or_default();
        groups.sort();
        groups
    }

    pub async fn contains_user(&self, tenant: &str, user_id: &str) -> bool {
        let tenants = self.tenants.read().await;
        tenants
            .get(tenant)
            .is_some_and(|directory| directory.users.contains_key(user_id))
    }

    /// Every call received through [`IdentityDirectory`], oldest first.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.log
            .lock()
            .map(|log| log.calls.clone())
            .unwrap_or_default()
    }

    /// Calls that changed directory state, oldest first.
    pub fn mutations(&self) -> Vec<DirectoryCall> {
        self.calls()
            .into_iter()
            .filter(DirectoryCall::is_mutation)
            .collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.calls.clear();
        }
    }

    /// Make the next call of `operation` fail with [`DirectoryError::Unavailable`].
    pub fn fail_next(&self, operation: DirectoryOperation) {
        if let Ok(mut log) = self.log.lock() {
            log.fail_next.insert(operation);
        }
    }

    /// Log the call and consume an injected failure, if any.
    fn record(&self, call: DirectoryCall) -> Result<(), DirectoryError> {
        let mut log = self.log.lock().map_err(|_| DirectoryError::Internal {
            message: "call log lock poisoned".to_string(),
        })?;
        let operation = call.operation();
        trace!("Directory call: {:?}", call);
        log.calls.push(call);

        if log.fail_next.remove(&operation) {
            return Err(DirectoryError::unavailable(format!(
                "injected failure for {:?}",
                operation
            )));
        }
        Ok(())
    }

    fn is_member(directory: &TenantDirectory, group_id: &str, user_id: &str) -> bool {
        directory
            .members
            .get(group_id)
            .is_some_and(|members| members.iter().any(|m| m.is_user(user_id)))
    }

    fn matches(directory: &TenantDirectory, user: &DirectoryUser, filter: &UserFilter) -> bool {
        if let Some(subtenant) = &filter.subtenant {
            if !user.has_subtenant(subtenant) {
                return false;
            }
        }
        if let Some(group) = &filter.group {
            if !Self::is_member(directory, group, &user.id) {
                return false;
            }
        }
        if let Some(user_name) = &filter.user_name {
            if &user.user_name != user_name {
                return false;
            }
        }
        true
    }
}

impl IdentityDirectory for InMemoryDirectory {
    type Error = DirectoryError;

    async fn list_users(
        &self,
        tenant: &str,
        filter: &UserFilter,
    ) -> Result<Vec<DirectoryUser>, Self::Error> {
        self.record(DirectoryCall::ListUsers {
            tenant: tenant.to_string(),
            filter: filter.clone(),
        })?;

        let tenants = self.tenants.read().await;
        let mut users: Vec<DirectoryUser> = match tenants.get(tenant) {
            Some(directory) => directory
                .users
                .values()
                .filter(|user| Self::matches(directory, user, filter))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn user_exists(
        &self,
        tenant: &str,
        subtenant: Option<&str>,
        user_name: &str,
    ) -> Result<bool, Self::Error> {
        self.record(DirectoryCall::UserExists {
            tenant: tenant.to_string(),
            subtenant: subtenant.map(str::to_string),
            user_name: user_name.to_string(),
        })?;

        let tenants = self.tenants.read().await;
        Ok(tenants.get(tenant).is_some_and(|directory| {
            directory.users.values().any(|user| {
                user.user_name == user_name && subtenant.is_none_or(|s| user.has_subtenant(s))
            })
        }))
    }

    async fn get_user(
        &self,
        tenant: &str,
        user_id: &str,
    ) -> Result<Option<DirectoryUser>, Self::Error> {
        self.record(DirectoryCall::GetUser {
            tenant: tenant.to_string(),
            user_id: user_id.to_string(),
        })?;

        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant)
            .and_then(|directory| directory.users.get(user_id))
            .cloned())
    }

    async fn create_user(
        &self,
        tenant: &str,
        user: NewDirectoryUser,
    ) -> Result<DirectoryUser, Self::Error> {
        self.record(DirectoryCall::CreateUser {
            tenant: tenant.to_string(),
            user: user.clone(),
        })?;

        let mut tenants = self.tenants.write().await;
        let directory = tenants.entry(tenant.to_string()).or_default();
        if directory
            .users
            .values()
            .any(|existing| existing.user_name == user.user_name)
        {
            return Err(DirectoryError::DuplicateUserName {
                tenant: tenant.to_string(),
                user_name: user.user_name,
            });
        }

        let created = DirectoryUser {
            id: Uuid::new_v4().to_string(),
            user_name: user.user_name,
            active: user.active,
            name: user.name,
            subtenants: user.subtenants.unwrap_or_default(),
            groups: Vec::new(),
        };
        directory.users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn delete_user(&self, tenant: &str, user_id: &str) -> Result<(), Self::Error> {
        self.record(DirectoryCall::DeleteUser {
            tenant: tenant.to_string(),
            user_id: user_id.to_string(),
        })?;

        let mut tenants = self.tenants.write().await;
        let directory = tenants
            .get_mut(tenant)
            .ok_or_else(|| DirectoryError::user_not_found(tenant, user_id))?;
        if directory.users.remove(user_id).is_none() {
            return Err(DirectoryError::user_not_found(tenant, user_id));
        }
        for members in directory.members.values_mut() {
            members.retain(|m| !m.is_user(user_id));
        }
        Ok(())
    }

    async fn list_groups(&self, tenant: &str) -> Result<Vec<DirectoryGroup>, Self::Error> {
        self.record(DirectoryCall::ListGroups {
            tenant: tenant.to_string(),
        })?;

        let tenants = self.tenants.read().await;
        let mut groups: Vec<DirectoryGroup> = tenants
            .get(tenant)
            .map(|directory| directory.groups.values().cloned().collect())
            .unwrap_or_default();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(groups)
    }

    async fn get_group_members(
        &self,
        tenant: &str,
        group_id: &str,
    ) -> Result<Vec<GroupMember>, Self::Error> {
        self.record(DirectoryCall::GetGroupMembers {
            tenant: tenant.to_string(),
            group_id: group_id.to_string(),
        })?;

        let tenants = self.tenants.read().await;
        let directory = tenants
            .get(tenant)
            .filter(|directory| directory.groups.contains_key(group_id))
            .ok_or_else(|| DirectoryError::group_not_found(tenant, group_id))?;
        Ok(directory.members.get(group_id).cloned().unwrap_or_default())
    }

    async fn add_user_to_group(
        &self,
        tenant: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<(), Self::Error> {
        self.record(DirectoryCall::AddUserToGroup {
            tenant: tenant.to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        })?;

        let mut tenants = self.tenants.write().await;
        let directory = tenants
            .get_mut(tenant)
            .ok_or_else(|| DirectoryError::group_not_found(tenant, group_id))?;
        if !directory.groups.contains_key(group_id) {
            return Err(DirectoryError::group_not_found(tenant, group_id));
        }
        if !directory.users.contains_key(user_id) {
            return Err(DirectoryError::user_not_found(tenant, user_id));
        }

        let members = directory.members.entry(group_id.to_string()).or_default();
        if !members.iter().any(|m| m.is_user(user_id)) {
            members.push(GroupMember::user(user_id));
        }
        Ok(())
    }

    async fn remove_user_from_group(
        &self,
        tenant: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<(), Self::Error> {
        self.record(DirectoryCall::RemoveUserFromGroup {
            tenant: tenant.to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        })?;

        let mut tenants = self.tenants.write().await;
        let members = tenants
            .get_mut(tenant)
            .and_then(|directory| directory.members.get_mut(group_id))
            .ok_or_else(|| DirectoryError::group_not_found(tenant, group_id))?;

        let before = members.len();
        members.retain(|m| !m.is_user(user_id));
        if members.len() == before {
            return Err(DirectoryError::NotAMember {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }
}
