//! Group-assignment rules.
//!
//! A user of an application belongs to exactly two of the application's
//! well-known directory groups: the group of its role, and the scope group
//! that admits it to the tenant (standard users) or to the subtenant
//! (subtenant users). Every other group a user belongs to is none of this
//! crate's business.
//!
//! ```rust
//! use app_tenancy::groups::WellKnownGroups;
//! use app_tenancy::model::Role;
//!
//! let groups = WellKnownGroups::new("ga", "gu", "la", "lu", "std", "sub");
//! let target = groups.assignment_for(Role::LocalAdmin, true);
//! assert_eq!(target.role_group, "la");
//! assert_eq!(target.scope_group, "sub");
//!
//! let plan = target.plan(["lu", "sub"]);
//! assert_eq!(plan.to_remove, vec!["lu"]);
//! assert_eq!(plan.to_add, vec!["la"]);
//! ```

use crate::model::Role;
use serde::{Deserialize, Serialize};

/// Ids of the directory groups with a fixed meaning for applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellKnownGroups {
    pub global_admin: String,
    pub global_user: String,
    pub local_admin: String,
    pub local_user: String,
    /// Scope group of users of tenant-wide applications
    pub standard_user: String,
    /// Scope group of users of subtenant applications
    pub subtenant_user: String,
}

impl WellKnownGroups {
    pub fn new(
        global_admin: impl Into<String>,
        global_user: impl Into<String>,
        local_admin: impl Into<String>,
        local_user: impl Into<String>,
        standard_user: impl Into<String>,
        subtenant_user: impl Into<String>,
    ) -> Self {
        Self {
            global_admin: global_admin.into(),
            global_user: global_user.into(),
            local_admin: local_admin.into(),
            local_user: local_user.into(),
            standard_user: standard_user.into(),
            subtenant_user: subtenant_user.into(),
        }
    }

    pub fn role_group(&self, role: Role) -> &str {
        match role {
            Role::GlobalAdmin | Role::SuperAdmin => &self.global_admin,
            Role::GlobalUser => &self.global_user,
            Role::LocalAdmin => &self.local_admin,
            Role::LocalUser => &self.local_user,
        }
    }

    pub fn scope_group(&self, is_subtenant_app: bool) -> &str {
        if is_subtenant_app {
            &self.subtenant_user
        } else {
            &self.standard_user
        }
    }

    /// The two groups a user with `role` must belong to.
    pub fn assignment_for(&self, role: Role, is_subtenant_app: bool) -> GroupAssignment {
        GroupAssignment {
            role_group: self.role_group(role).to_string(),
            scope_group: self.scope_group(is_subtenant_app).to_string(),
        }
    }

    /// Every well-known group id, role groups first.
    pub fn all(&self) -> Vec<&str> {
        let mut ids = vec![
            self.global_admin.as_str(),
            self.global_user.as_str(),
            self.local_admin.as_str(),
            self.local_user.as_str(),
            self.standard_user.as_str(),
            self.subtenant_user.as_str(),
        ];
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids
    }

    /// Groups a role change may touch: the four role groups and the scope
    /// group of the app. The other scope group belongs to other apps.
    pub fn managed_groups(&self, is_subtenant_app: bool) -> Vec<&str> {
        let mut ids = vec![
            self.global_admin.as_str(),
            self.global_user.as_str(),
            self.local_admin.as_str(),
            self.local_user.as_str(),
            self.scope_group(is_subtenant_app),
        ];
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids
    }

    pub fn is_well_known(&self, group_id: &str) -> bool {
        self.all().contains(&group_id)
    }
}

/// Target group memberships of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAssignment {
    pub role_group: String,
    pub scope_group: String,
}

impl GroupAssignment {
    pub fn group_ids(&self) -> Vec<&str> {
        if self.role_group == self.scope_group {
            vec![self.role_group.as_str()]
        } else {
            vec![self.role_group.as_str(), self.scope_group.as_str()]
        }
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.role_group == group_id || self.scope_group == group_id
    }

    /// Minimal set of membership changes from `current` to this assignment.
    ///
    /// `current` should list only groups from
    /// [`WellKnownGroups::managed_groups`]; memberships that are both current
    /// and targeted are left alone.
    pub fn plan<'a>(&self, current: impl IntoIterator<Item = &'a str>) -> MembershipPlan {
        let current: Vec<&str> = current.into_iter().collect();

        let mut to_remove: Vec<String> = Vec::new();
        for group_id in &current {
            if !self.contains(group_id) && !to_remove.iter().any(|g| g.as_str() == *group_id) {
                to_remove.push(group_id.to_string());
            }
        }

        let to_add = self
            .group_ids()
            .into_iter()
            .filter(|group_id| !current.contains(group_id))
            .map(str::to_string)
            .collect();

        MembershipPlan { to_remove, to_add }
    }
}

/// Membership changes needed to reach a [`GroupAssignment`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MembershipPlan {
    pub to_remove: Vec<String>,
    pub to_add: Vec<String>,
}

impl MembershipPlan {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}
