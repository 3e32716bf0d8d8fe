//! Plant and application-config access of a tenant application.

use super::TenantApplication;
use crate::directory::IdentityDirectory;
use crate::error::{AppError, AppResult};
use crate::model::{AppStorageRecord, PlantStorageRecord};
use crate::storage::FileStorage;
use log::info;

impl<S, D> TenantApplication<S, D>
where
    S: FileStorage,
    D: IdentityDirectory,
{
    pub async fn get_app_config(&mut self) -> AppResult<AppStorageRecord> {
        self.ensure_initialized()?;
        self.app_config.get().await
    }

    pub async fn set_app_config(&mut self, record: AppStorageRecord) -> AppResult<()> {
        self.ensure_initialized()?;
        self.app_config.set(record).await?;
        info!("Updated app config of '{}'", self.identity.app_id);
        Ok(())
    }

    /// `maxNumberOfUsers` of the app config; `None` means unlimited.
    pub async fn get_max_number_of_users(&mut self) -> AppResult<Option<u64>> {
        self.ensure_initialized()?;
        self.app_config.max_number_of_users().await
    }

    pub async fn plant_exists(&mut self, plant_id: &str) -> AppResult<bool> {
        self.ensure_initialized()?;
        self.plants.exists_by_id(plant_id).await
    }

    pub async fn get_plant(&mut self, plant_id: &str) -> AppResult<PlantStorageRecord> {
        self.ensure_initialized()?;
        self.plants.get(plant_id).await
    }

    pub async fn get_all_plants(&mut self) -> AppResult<Vec<(String, PlantStorageRecord)>> {
        self.ensure_initialized()?;
        self.plants.fetch_all().await
    }

    pub async fn set_plant(&mut self, plant_id: &str, record: PlantStorageRecord) -> AppResult<()> {
        self.ensure_initialized()?;
        self.plants.set(plant_id, record).await
    }

    pub async fn delete_plant(&mut self, plant_id: &str) -> AppResult<()> {
        self.ensure_initialized()?;
        if !self.plants.exists_by_id(plant_id).await? {
            return Err(AppError::not_found(format!(
                "Plant {} does not exist!",
                plant_id
            )));
        }
        self.plants.delete(plant_id).await?;
        info!("Deleted plant {} of app '{}'", plant_id, self.identity.app_id);
        Ok(())
    }
}
