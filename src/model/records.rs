//! Records persisted as JSON files in application storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A user's privilege tier within an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    GlobalAdmin,
    GlobalUser,
    LocalAdmin,
    LocalUser,
    /// Administrator of the hosting tenant
    SuperAdmin,
}

/// Permission level a user holds on a single plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlantPermission {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    pub role: Role,
    #[serde(default)]
    pub plants: HashMap<String, PlantPermission>,
}

impl UserPermissions {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            plants: HashMap::new(),
        }
    }

    pub fn with_plant(mut self, plant_id: impl Into<String>, permission: PlantPermission) -> Self {
        self.plants.insert(plant_id.into(), permission);
        self
    }

    /// Effective permission on a plant, taking global roles into account.
    pub fn plant_permission(&self, plant_id: &str) -> Option<PlantPermission> {
        match self.role {
            Role::GlobalAdmin | Role::SuperAdmin => Some(PlantPermission::Admin),
            Role::GlobalUser => Some(
                self.plants
                    .get(plant_id)
                    .copied()
                    .unwrap_or(PlantPermission::User),
            ),
            Role::LocalAdmin | Role::LocalUser => self.plants.get(plant_id).copied(),
        }
    }
}

/// Per-user configuration file of an application.
///
/// `data` and `config` map plant ids to arbitrary JSON owned by the
/// application front end. The record is always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStorageRecord {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub config: Map<String, Value>,
    pub user_name: String,
    pub permissions: UserPermissions,
}

impl UserStorageRecord {
    pub fn new(user_name: impl Into<String>, permissions: UserPermissions) -> Self {
        Self {
            data: Map::new(),
            config: Map::new(),
            user_name: user_name.into(),
            permissions,
        }
    }

    pub fn role(&self) -> Role {
        self.permissions.role
    }
}

/// Per-plant configuration file; the payload is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlantStorageRecord {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub config: Value,
}

/// Application-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStorageRecord {
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default = "empty_object")]
    pub config: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for AppStorageRecord {
    fn default() -> Self {
        Self {
            data: empty_object(),
            config: empty_object(),
        }
    }
}
