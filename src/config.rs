//! Configuration of a tenant application.
//!
//! A [`TenantAppConfig`] names where the application lives (its
//! [`AppIdentity`]) and which directory groups carry the role and scope
//! meaning for it ([`WellKnownGroups`]). It is usually read from a JSON file
//! written by the deployment tooling, or assembled with the builder.
//!
//! # Example Usage
//!
//! ```rust
//! use app_tenancy::config::TenantAppConfig;
//!
//! let config = TenantAppConfig::builder("hosttenant", "app1", "asset1", "tenant1")
//!     .with_subtenant("subtenant2")
//!     .with_groups("ga", "gu", "la", "lu", "std", "sub")
//!     .build()
//!     .expect("Valid tenant app configuration");
//! assert!(config.identity.is_subtenant_app());
//! ```
//!
//! The JSON form:
//!
//! ```json
//! {
//!   "identity": {
//!     "storageTenant": "hosttenant",
//!     "appId": "app1",
//!     "assetId": "asset1",
//!     "appTenant": "tenant1",
//!     "subtenantId": "subtenant2"
//!   },
//!   "groups": {
//!     "globalAdmin": "ga", "globalUser": "gu",
//!     "localAdmin": "la", "localUser": "lu",
//!     "standardUser": "std", "subtenantUser": "sub"
//!   }
//! }
//! ```

use crate::groups::WellKnownGroups;
use crate::model::AppIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantAppConfig {
    pub identity: AppIdentity,
    pub groups: WellKnownGroups,
}

impl TenantAppConfig {
    pub fn builder(
        storage_tenant: impl Into<String>,
        app_id: impl Into<String>,
        asset_id: impl Into<String>,
        app_tenant: impl Into<String>,
    ) -> TenantAppConfigBuilder {
        TenantAppConfigBuilder::new(AppIdentity::new(
            storage_tenant,
            app_id,
            asset_id,
            app_tenant,
        ))
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Reject empty identifiers and group ids shared by two meanings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let identity = &self.identity;
        let required = [
            ("storageTenant", &identity.storage_tenant),
            ("appId", &identity.app_id),
            ("assetId", &identity.asset_id),
            ("appTenant", &identity.app_tenant),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "identity.{} must not be empty",
                    field
                )));
            }
        }
        if identity
            .subtenant_id
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(ConfigError::validation(
                "identity.subtenantId must not be empty when present",
            ));
        }

        let groups = &self.groups;
        let ids = [
            ("globalAdmin", &groups.global_admin),
            ("globalUser", &groups.global_user),
            ("localAdmin", &groups.local_admin),
            ("localUser", &groups.local_user),
            ("standardUser", &groups.standard_user),
            ("subtenantUser", &groups.subtenant_user),
        ];
        let mut seen = HashSet::new();
        for (field, id) in ids {
            if id.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "groups.{} must not be empty",
                    field
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(ConfigError::validation(format!(
                    "groups.{} reuses group id '{}'",
                    field, id
                )));
            }
        }
        Ok(())
    }
}

pub struct TenantAppConfigBuilder {
    identity: AppIdentity,
    groups: Option<WellKnownGroups>,
}

impl TenantAppConfigBuilder {
    fn new(identity: AppIdentity) -> Self {
        Self {
            identity,
            groups: None,
        }
    }

    pub fn with_subtenant(mut self, subtenant_id: impl Into<String>) -> Self {
        self.identity.subtenant_id = Some(subtenant_id.into());
        self
    }

    pub fn with_groups(
        mut self,
        global_admin: impl Into<String>,
        global_user: impl Into<String>,
        local_admin: impl Into<String>,
        local_user: impl Into<String>,
        standard_user: impl Into<String>,
        subtenant_user: impl Into<String>,
    ) -> Self {
        self.groups = Some(WellKnownGroups::new(
            global_admin,
            global_user,
            local_admin,
            local_user,
            standard_user,
            subtenant_user,
        ));
        self
    }

    pub fn with_well_known_groups(mut self, groups: WellKnownGroups) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn build(self) -> Result<TenantAppConfig, ConfigError> {
        let groups = self
            .groups
            .ok_or_else(|| ConfigError::validation("well-known groups are not configured"))?;
        let config = TenantAppConfig {
            identity: self.identity,
            groups,
        };
        config.validate()?;
        Ok(config)
    }
}
