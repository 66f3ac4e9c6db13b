use async_trait::async_trait;

use crate::domain::entities::Trigger;
use crate::domain::value_objects::AutomationSettings;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Persisted automation settings (lock chance, lock durations, credentials)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepositoryPort: Send + Sync {
    async fn get(&self) -> Result<AutomationSettings, RepositoryError>;
    async fn save(&self, settings: &AutomationSettings) -> Result<(), RepositoryError>;
    async fn reset(&self) -> Result<AutomationSettings, RepositoryError>;
}

/// Persisted ordered trigger list
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriggerRepositoryPort: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Trigger>, RepositoryError>;
    async fn save_all(&self, triggers: &[Trigger]) -> Result<(), RepositoryError>;
}
