//! Cache of the application-level configuration file.

use crate::error::{AppError, AppResult};
use crate::model::AppStorageRecord;
use crate::storage::{FileKey, FileStorage};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

/// Name of the application configuration file inside the app's container.
pub const APP_CONFIG_FILE_NAME: &str = "main.app.config.json";

const MAX_NUMBER_OF_USERS: &str = "maxNumberOfUsers";

/// Write-through cache of `main.app.config.json`.
pub struct AppConfigCache<S> {
    storage: Arc<S>,
    key: FileKey,
    record: Option<AppStorageRecord>,
}

impl<S: FileStorage> AppConfigCache<S> {
    pub fn new(storage: Arc<S>, tenant: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            storage,
            key: FileKey::new(tenant, container, APP_CONFIG_FILE_NAME),
            record: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.record.is_some()
    }

    /// Fetch the config file, creating an empty one when storage has none.
    pub async fn load(&mut self) -> AppResult<()> {
        let content = self
            .storage
            .get(&self.key)
            .await
            .map_err(AppError::storage)?;

        let record = match content {
            Some(value) => serde_json::from_value(value)?,
            None => {
                info!("No app config at {}, writing an empty one", self.key);
                let record = AppStorageRecord::default();
                self.storage
                    .set(&self.key, serde_json::to_value(&record)?)
                    .await
                    .map_err(AppError::storage)?;
                record
            }
        };
        self.record = Some(record);
        Ok(())
    }

    pub async fn get(&mut self) -> AppResult<AppStorageRecord> {
        if let Some(record) = &self.record {
            return Ok(record.clone());
        }

        debug!("App config not cached, fetching {}", self.key);
        let content = self
            .storage
            .get(&self.key)
            .await
            .map_err(AppError::storage)?
            .ok_or_else(|| AppError::not_found("Application config not found!"))?;
        let record: AppStorageRecord = serde_json::from_value(content)?;
        self.record = Some(record.clone());
        Ok(record)
    }

    pub async fn set(&mut self, record: AppStorageRecord) -> AppResult<()> {
        self.storage
            .set(&self.key, serde_json::to_value(&record)?)
            .await
            .map_err(AppError::storage)?;
        self.record = Some(record);
        Ok(())
    }

    /// Maximum number of users of the application.
    ///
    /// `Ok(None)` means the field is present and `null`: no limit. A missing
    /// field is a configuration error, as is anything but a non-negative
    /// integer.
    pub async fn max_number_of_users(&mut self) -> AppResult<Option<u64>> {
        let record = self.get().await?;
        match record.config.get(MAX_NUMBER_OF_USERS) {
            None => Err(AppError::configuration(
                "maxNumberOfUsers not defined in app config!",
            )),
            Some(Value::Null) => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                AppError::configuration(format!("Invalid maxNumberOfUsers in app config: {}", value))
            }),
        }
    }
}
