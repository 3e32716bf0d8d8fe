//! Data model for tenant applications.
//!
//! This module contains the records persisted in file storage for an
//! application (one per user, one per plant, one for the app itself) and the
//! identity that scopes an application to a tenant or subtenant.

pub mod identity;
pub mod records;

pub use identity::AppIdentity;
pub use records::{
    AppStorageRecord, PlantPermission, PlantStorageRecord, Role, UserPermissions,
    UserStorageRecord,
};
