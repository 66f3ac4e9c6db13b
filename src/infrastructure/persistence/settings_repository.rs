use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{RepositoryError, SettingsRepositoryPort};
use crate::domain::value_objects::AutomationSettings;

/// Settings stored as a serialized JSON document in memory
pub struct InMemorySettingsRepository {
    document: RwLock<Option<String>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self {
            document: RwLock::new(None),
        }
    }
}

impl Default for InMemorySettingsRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsRepositoryPort for InMemorySettingsRepository {
    async fn get(&self) -> Result<AutomationSettings, RepositoryError> {
        match &*self.document.read().await {
            // Nothing saved yet: env defaults
            None => Ok(AutomationSettings::from_env()),
            Some(json) => serde_json::from_str(json)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
        }
    }

    async fn save(&self, settings: &AutomationSettings) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        *self.document.write().await = Some(json);
        Ok(())
    }

    async fn reset(&self) -> Result<AutomationSettings, RepositoryError> {
        *self.document.write().await = None;
        Ok(AutomationSettings::from_env())
    }
}
