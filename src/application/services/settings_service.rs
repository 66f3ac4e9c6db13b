//! Settings Service - Cached access to the persisted automation settings

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::warn;

use crate::application::ports::outbound::SettingsRepositoryPort;
use crate::domain::value_objects::AutomationSettings;

pub struct SettingsService {
    repository: Arc<dyn SettingsRepositoryPort>,
    cache: RwLock<Option<AutomationSettings>>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepositoryPort>) -> Self {
        Self {
            repository,
            cache: RwLock::new(None),
        }
    }

    /// Get current settings (cached)
    pub async fn get(&self) -> AutomationSettings {
        let cache = self.cache.read().await;
        if let Some(settings) = &*cache {
            return settings.clone();
        }
        drop(cache);

        match self.repository.get().await {
            Ok(settings) => {
                *self.cache.write().await = Some(settings.clone());
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using environment defaults");
                AutomationSettings::from_env()
            }
        }
    }

    /// Cached settings without waiting; env defaults before the first load
    /// or while a save holds the cache
    pub fn current(&self) -> AutomationSettings {
        match self.cache.try_read() {
            Ok(cache) => cache.clone().unwrap_or_else(AutomationSettings::from_env),
            Err(_) => AutomationSettings::from_env(),
        }
    }

    /// Save settings; every consumer sees them on its next read
    pub async fn update(&self, settings: AutomationSettings) -> Result<()> {
        self.repository
            .save(&settings)
            .await
            .context("Failed to save automation settings")?;
        *self.cache.write().await = Some(settings);
        Ok(())
    }

    /// Reset to env/defaults
    pub async fn reset(&self) -> Result<AutomationSettings> {
        let settings = self
            .repository
            .reset()
            .await
            .context("Failed to reset automation settings")?;
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }
}
