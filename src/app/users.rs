//! User lifecycle of a tenant application.

use super::{AppUser, TenantApplication};
use crate::directory::{GroupRef, IdentityDirectory, NewDirectoryUser, UserFilter};
use crate::error::{AppError, AppResult};
use crate::model::UserStorageRecord;
use crate::storage::FileStorage;
use log::{debug, info, trace, warn};

impl<S, D> TenantApplication<S, D>
where
    S: FileStorage,
    D: IdentityDirectory,
{
    /// Id of the directory user named `user_name` within the app's scope.
    ///
    /// For a subtenant app only users of that subtenant are considered; there
    /// is no fallback to the whole tenant (see
    /// [`get_user_id_if_exists_in_tenant`](Self::get_user_id_if_exists_in_tenant)).
    pub async fn get_user_id_if_exists(&mut self, user_name: &str) -> AppResult<Option<String>> {
        self.ensure_initialized()?;
        let filter = UserFilter::new()
            .with_optional_subtenant(self.identity.subtenant())
            .with_user_name(user_name);
        let matches = self.find_directory_users(&filter, user_name).await?;

        match matches.as_slice() {
            [user] => match self.identity.subtenant() {
                Some(subtenant) if !user.has_subtenant(subtenant) => Ok(None),
                _ => Ok(Some(user.id.clone())),
            },
            _ => Ok(None),
        }
    }

    /// Id of the directory user named `user_name` anywhere in the tenant.
    pub async fn get_user_id_if_exists_in_tenant(
        &mut self,
        user_name: &str,
    ) -> AppResult<Option<String>> {
        self.ensure_initialized()?;
        let filter = UserFilter::new().with_user_name(user_name);
        let matches = self.find_directory_users(&filter, user_name).await?;

        match matches.as_slice() {
            [user] => Ok(Some(user.id.clone())),
            _ => Ok(None),
        }
    }

    async fn find_directory_users(
        &self,
        filter: &UserFilter,
        user_name: &str,
    ) -> AppResult<Vec<crate::directory::DirectoryUser>> {
        let users = self
            .directory
            .list_users(&self.identity.app_tenant, filter)
            .await
            .map_err(AppError::directory)?;
        Ok(users
            .into_iter()
            .filter(|user| user.user_name == user_name)
            .collect())
    }

    /// Whether any user record of this app carries `user_name`.
    pub async fn user_exists_in_storage(&mut self, user_name: &str) -> AppResult<bool> {
        self.ensure_initialized()?;
        self.users.exists_by_user_name(user_name).await
    }

    /// Whether the tenant has a user named `user_name`, in any subtenant.
    pub async fn user_exists_in_tenant(&mut self, user_name: &str) -> AppResult<bool> {
        self.ensure_initialized()?;
        self.directory
            .user_exists(&self.identity.app_tenant, None, user_name)
            .await
            .map_err(AppError::directory)
    }

    /// Whether the tenant has a user named `user_name` that also has a
    /// storage record in this app. Storage is not consulted when the tenant
    /// has no such user.
    pub async fn user_exists_in_tenant_and_storage(&mut self, user_name: &str) -> AppResult<bool> {
        if !self.user_exists_in_tenant(user_name).await? {
            return Ok(false);
        }

        match self.get_user_id_if_exists_in_tenant(user_name).await? {
            Some(user_id) => self.users.exists_by_id(&user_id).await,
            None => Ok(false),
        }
    }

    /// Whether the user has a storage record in this app.
    ///
    /// Assignment is a storage matter only; the directory is not asked.
    pub async fn user_assigned_to_app(&mut self, user_id: &str) -> AppResult<bool> {
        self.ensure_initialized()?;
        self.users.exists_by_id(user_id).await
    }

    /// Directory entry and storage record of an assigned user.
    ///
    /// The directory entry's groups are completed with every tenant group
    /// that lists the user as a direct member.
    pub async fn get_user(&mut self, user_id: &str) -> AppResult<AppUser> {
        if !self.user_assigned_to_app(user_id).await? {
            return Err(AppError::not_assigned("User not assigned to the app!"));
        }

        let tenant = &self.identity.app_tenant;
        let mut directory_user = self
            .directory
            .get_user(tenant, user_id)
            .await
            .map_err(AppError::directory)?
            .ok_or_else(|| {
                AppError::not_found(format!("User {} not found in tenant {}!", user_id, tenant))
            })?;

        let groups = self
            .directory
            .list_groups(tenant)
            .await
            .map_err(AppError::directory)?;
        for group in groups {
            if directory_user.is_member_of(&group.id) {
                continue;
            }
            let members = self
                .directory
                .get_group_members(tenant, &group.id)
                .await
                .map_err(AppError::directory)?;
            if members.iter().any(|member| member.is_user(user_id)) {
                directory_user
                    .groups
                    .push(GroupRef::direct(group.display_name, group.id));
            }
        }

        let storage = self.users.get(user_id).await?;
        Ok(AppUser {
            directory: directory_user,
            storage,
        })
    }

    /// Every user record of this app, after reconciling with storage.
    pub async fn get_all_users(&mut self) -> AppResult<Vec<(String, UserStorageRecord)>> {
        self.ensure_initialized()?;
        self.users.fetch_all().await
    }

    /// Create a directory user, its storage record and its group memberships.
    ///
    /// The steps run in that order and are not rolled back: when the storage
    /// write or a group assignment fails, the directory user stays behind
    /// and its id is logged.
    pub async fn create_user(&mut self, record: UserStorageRecord) -> AppResult<AppUser> {
        self.ensure_initialized()?;
        let tenant = self.identity.app_tenant.clone();

        let mut payload = NewDirectoryUser::new(&record.user_name);
        if let Some(subtenant) = self.identity.subtenant() {
            payload = payload.with_subtenant(subtenant);
        }
        let created = self
            .directory
            .create_user(&tenant, payload)
            .await
            .map_err(AppError::directory)?;
        info!(
            "Created directory user '{}' ({}) for app '{}'",
            record.user_name, created.id, self.identity.app_id
        );
        trace!("Storage record: {:?}", record);

        let assignment = self
            .groups
            .assignment_for(record.role(), self.is_subtenant_app());

        if let Err(e) = self.users.set(&created.id, record).await {
            warn!(
                "Storage write failed after creating directory user {}, user is orphaned: {}",
                created.id, e
            );
            return Err(e);
        }

        for group_id in assignment.group_ids() {
            if let Err(e) = self
                .directory
                .add_user_to_group(&tenant, group_id, &created.id)
                .await
            {
                warn!(
                    "Adding user {} to group {} failed after its storage record was written: {}",
                    created.id, group_id, e
                );
                return Err(AppError::directory(e));
            }
        }

        self.get_user(&created.id).await
    }

    /// Replace a user's storage record and move it to the groups of its new role.
    ///
    /// Only the role groups and the app's scope group are touched, and only
    /// where membership has to change. The storage record is written after
    /// every group change succeeded.
    pub async fn update_user(
        &mut self,
        user_id: &str,
        record: UserStorageRecord,
    ) -> AppResult<AppUser> {
        if !self.user_assigned_to_app(user_id).await? {
            return Err(AppError::not_assigned(
                "Cannot edit user that is not assigned to the app!",
            ));
        }

        let current = self.current_managed_groups(user_id).await?;
        let plan = self
            .groups
            .assignment_for(record.role(), self.is_subtenant_app())
            .plan(current.iter().map(String::as_str));
        debug!(
            "Group changes for user {}: remove {:?}, add {:?}",
            user_id, plan.to_remove, plan.to_add
        );

        let tenant = &self.identity.app_tenant;
        for group_id in &plan.to_remove {
            self.directory
                .remove_user_from_group(tenant, group_id, user_id)
                .await
                .map_err(AppError::directory)?;
        }
        for group_id in &plan.to_add {
            self.directory
                .add_user_to_group(tenant, group_id, user_id)
                .await
                .map_err(AppError::directory)?;
        }

        self.users.set(user_id, record).await?;
        info!("Updated user {} of app '{}'", user_id, self.identity.app_id);

        self.get_user(user_id).await
    }

    /// Delete the directory user, then its storage record.
    ///
    /// A failed directory delete leaves the storage record in place.
    pub async fn delete_user(&mut self, user_id: &str) -> AppResult<()> {
        if !self.user_assigned_to_app(user_id).await? {
            return Err(AppError::not_assigned(
                "Cannot delete user that is not assigned to the app!",
            ));
        }

        self.directory
            .delete_user(&self.identity.app_tenant, user_id)
            .await
            .map_err(AppError::directory)?;
        self.users.delete(user_id).await?;

        info!("Deleted user {} of app '{}'", user_id, self.identity.app_id);
        Ok(())
    }

    /// Managed groups the user is currently a direct member of.
    async fn current_managed_groups(&self, user_id: &str) -> AppResult<Vec<String>> {
        let mut current = Vec::new();
        for group_id in self.groups.managed_groups(self.is_subtenant_app()) {
            let members = self
                .directory
                .get_group_members(&self.identity.app_tenant, group_id)
                .await
                .map_err(AppError::directory)?;
            if members.iter().any(|member| member.is_user(user_id)) {
                current.push(group_id.to_string());
            }
        }
        Ok(current)
    }
}
