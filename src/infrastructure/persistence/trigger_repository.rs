use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{RepositoryError, TriggerRepositoryPort};
use crate::domain::entities::Trigger;

/// Ordered trigger list stored as a serialized JSON array in memory
pub struct InMemoryTriggerRepository {
    document: RwLock<String>,
}

impl InMemoryTriggerRepository {
    pub fn new() -> Self {
        Self {
            document: RwLock::new("[]".to_string()),
        }
    }

    /// Seed the store with a JSON array of triggers
    pub fn from_json(json: impl Into<String>) -> Result<Self, RepositoryError> {
        let json = json.into();
        serde_json::from_str::<Vec<Trigger>>(&json)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(Self {
            document: RwLock::new(json),
        })
    }

    pub async fn to_json(&self) -> String {
        self.document.read().await.clone()
    }
}

impl Default for InMemoryTriggerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TriggerRepositoryPort for InMemoryTriggerRepository {
    async fn load_all(&self) -> Result<Vec<Trigger>, RepositoryError> {
        serde_json::from_str(&self.document.read().await)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn save_all(&self, triggers: &[Trigger]) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(triggers)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        *self.document.write().await = json;
        Ok(())
    }
}
