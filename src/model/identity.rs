//! Identity of a tenant application.

use serde::{Deserialize, Serialize};

/// Where an application lives and whom it serves.
///
/// `storage_tenant` and `asset_id` locate the application's files, while
/// `app_tenant` and `subtenant_id` locate its users in the identity
/// directory. An application bound to a subtenant only manages users of that
/// subtenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIdentity {
    pub storage_tenant: String,
    pub app_id: String,
    pub asset_id: String,
    pub app_tenant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtenant_id: Option<String>,
}

impl AppIdentity {
    pub fn new(
        storage_tenant: impl Into<String>,
        app_id: impl Into<String>,
        asset_id: impl Into<String>,
        app_tenant: impl Into<String>,
    ) -> Self {
        Self {
            storage_tenant: storage_tenant.into(),
            app_id: app_id.into(),
            asset_id: asset_id.into(),
            app_tenant: app_tenant.into(),
            subtenant_id: None,
        }
    }

    /// Bind the application to a subtenant.
    pub fn with_subtenant(mut self, subtenant_id: impl Into<String>) -> Self {
        self.subtenant_id = Some(subtenant_id.into());
        self
    }

    pub fn is_subtenant_app(&self) -> bool {
        self.subtenant_id.is_some()
    }

    /// Storage container holding every file of this application.
    pub fn container(&self) -> &str {
        &self.asset_id
    }

    pub fn subtenant(&self) -> Option<&str> {
        self.subtenant_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope() {
        let identity = AppIdentity::new("hosttenant", "app1", "asset1", "tenant1");
        assert!(!identity.is_subtenant_app());
        assert_eq!(identity.container(), "asset1");

        let scoped = identity.with_subtenant("subtenant2");
        assert!(scoped.is_subtenant_app());
        assert_eq!(scoped.subtenant(), Some("subtenant2"));
    }

    #[test]
    fn test_serialization_omits_missing_subtenant() {
        let identity = AppIdentity::new("hosttenant", "app1", "asset1", "tenant1");
        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["storageTenant"], "hosttenant");
        assert!(value.get("subtenantId").is_none());
    }
}
