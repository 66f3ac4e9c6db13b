//! Trigger Service - The trigger registry
//!
//! Holds the ordered trigger collection, answers match queries over a snapshot
//! and persists every configuration change. The registry never executes
//! actions itself.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::TriggerRepositoryPort;
use crate::domain::entities::Trigger;
use crate::domain::events::AutomationEvent;
use crate::domain::value_objects::{PlayerName, TriggerId};

/// Trigger registry use cases
#[async_trait]
pub trait TriggerService: Send + Sync {
    /// Enabled triggers matching `event`, priority descending then id
    async fn find_matches(&self, event: &AutomationEvent) -> Vec<Trigger>;

    async fn list(&self) -> Vec<Trigger>;

    async fn get(&self, id: TriggerId) -> Option<Trigger>;

    async fn create(&self, trigger: Trigger) -> Result<Trigger>;

    /// Replace every field of the stored trigger except its id
    async fn apply_changes(&self, id: TriggerId, edited: Trigger) -> Result<bool>;

    /// Deep-copy a trigger under a new id, appended to the list
    async fn clone_trigger(&self, id: TriggerId) -> Result<Option<Trigger>>;

    async fn delete(&self, id: TriggerId) -> Result<bool>;

    /// Flip the enabled flag; returns the new state
    async fn toggle_state(&self, id: TriggerId) -> Result<Option<bool>>;

    async fn enable(&self, id: TriggerId) -> Result<bool>;

    async fn disable(&self, id: TriggerId) -> Result<bool>;

    /// Replace the live collection with the persisted one
    async fn reload(&self) -> Result<usize>;
}

pub struct TriggerServiceImpl {
    repository: Arc<dyn TriggerRepositoryPort>,
    triggers: RwLock<Vec<Trigger>>,
    /// Serializes writers so the live list lock is only held for the swap
    writer: Mutex<()>,
    client_name: PlayerName,
}

impl TriggerServiceImpl {
    pub fn new(repository: Arc<dyn TriggerRepositoryPort>, client_name: PlayerName) -> Self {
        Self {
            repository,
            triggers: RwLock::new(Vec::new()),
            writer: Mutex::new(()),
            client_name,
        }
    }

    /// Apply `change` to a copy, persist it, then publish it as the live list.
    /// `None` from `change` means nothing changed and nothing is saved.
    /// Readers keep seeing the previous list while the save is in flight.
    async fn mutate<R, F>(&self, change: F) -> Result<Option<R>>
    where
        R: Send,
        F: FnOnce(&mut Vec<Trigger>) -> Option<R> + Send,
    {
        let _writer = self.writer.lock().await;
        let mut next = self.triggers.read().await.clone();
        let Some(result) = change(&mut next) else {
            return Ok(None);
        };
        self.repository
            .save_all(&next)
            .await
            .context("Failed to persist trigger list")?;
        *self.triggers.write().await = next;
        Ok(Some(result))
    }

    async fn set_enabled(&self, id: TriggerId, enabled: bool) -> Result<bool> {
        let changed = self
            .mutate(|triggers| {
                let trigger = triggers.iter_mut().find(|t| t.id == id)?;
                trigger.enabled = enabled;
                Some(())
            })
            .await?;
        Ok(changed.is_some())
    }
}

#[async_trait]
impl TriggerService for TriggerServiceImpl {
    async fn find_matches(&self, event: &AutomationEvent) -> Vec<Trigger> {
        let snapshot = self.triggers.read().await.clone();
        let mut matches: Vec<Trigger> = snapshot
            .into_iter()
            .filter(|trigger| trigger.matches(event, &self.client_name))
            .collect();
        matches.sort_by(Trigger::dispatch_order);
        debug!(kind = ?event.kind(), count = matches.len(), "Matched triggers");
        matches
    }

    async fn list(&self) -> Vec<Trigger> {
        self.triggers.read().await.clone()
    }

    async fn get(&self, id: TriggerId) -> Option<Trigger> {
        self.triggers.read().await.iter().find(|t| t.id == id).cloned()
    }

    #[instrument(skip(self, trigger), fields(trigger_id = %trigger.id))]
    async fn create(&self, trigger: Trigger) -> Result<Trigger> {
        info!(label = %trigger.label, kind = ?trigger.kind(), "Creating trigger");
        let created = trigger.clone();
        self.mutate(move |triggers| {
            triggers.push(trigger);
            Some(())
        })
        .await?;
        Ok(created)
    }

    #[instrument(skip(self, edited))]
    async fn apply_changes(&self, id: TriggerId, edited: Trigger) -> Result<bool> {
        info!(trigger_id = %id, "Applying trigger changes");
        let changed = self
            .mutate(move |triggers| {
                let trigger = triggers.iter_mut().find(|t| t.id == id)?;
                trigger.apply_changes(&edited);
                Some(())
            })
            .await?;
        Ok(changed.is_some())
    }

    #[instrument(skip(self))]
    async fn clone_trigger(&self, id: TriggerId) -> Result<Option<Trigger>> {
        self.mutate(|triggers| {
            let copy = triggers.iter().find(|t| t.id == id)?.duplicate();
            triggers.push(copy.clone());
            info!(source = %id, trigger_id = %copy.id, "Cloned trigger");
            Some(copy)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: TriggerId) -> Result<bool> {
        info!(trigger_id = %id, "Deleting trigger");
        let removed = self
            .mutate(|triggers| {
                let index = triggers.iter().position(|t| t.id == id)?;
                triggers.remove(index);
                Some(())
            })
            .await?;
        Ok(removed.is_some())
    }

    #[instrument(skip(self))]
    async fn toggle_state(&self, id: TriggerId) -> Result<Option<bool>> {
        self.mutate(|triggers| {
            let trigger = triggers.iter_mut().find(|t| t.id == id)?;
            trigger.enabled = !trigger.enabled;
            debug!(trigger_id = %id, enabled = trigger.enabled, "Toggled trigger");
            Some(trigger.enabled)
        })
        .await
    }

    async fn enable(&self, id: TriggerId) -> Result<bool> {
        self.set_enabled(id, true).await
    }

    async fn disable(&self, id: TriggerId) -> Result<bool> {
        self.set_enabled(id, false).await
    }

    #[instrument(skip(self))]
    async fn reload(&self) -> Result<usize> {
        let _writer = self.writer.lock().await;
        let loaded = self
            .repository
            .load_all()
            .await
            .context("Failed to load trigger list")?;
        let count = loaded.len();
        *self.triggers.write().await = loaded;
        info!(count, "Loaded triggers");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{MockTriggerRepositoryPort, RepositoryError};
    use crate::domain::entities::{GagTrigger, InvokableAction, TriggerDetection};
    use crate::domain::value_objects::{GagRef, GagType, NewState, UserUid};

    fn client() -> PlayerName {
        PlayerName::new("Alia Fenn@Lamia")
    }

    fn gag_trigger(priority: i32) -> Trigger {
        Trigger::new(
            format!("gag {priority}"),
            TriggerDetection::GagState(GagTrigger {
                gag: GagRef::Any,
                new_state: NewState::Enabled,
            }),
            InvokableAction::text("/e struggles"),
        )
        .with_priority(priority)
    }

    fn gag_event() -> AutomationEvent {
        AutomationEvent::GagStateChanged {
            gag: GagType::new("Ball Gag"),
            slot: 0,
            new_state: NewState::Enabled,
            enactor: UserUid::new("self"),
        }
    }

    fn accepting_repository() -> MockTriggerRepositoryPort {
        let mut repository = MockTriggerRepositoryPort::new();
        repository.expect_save_all().returning(|_| Ok(()));
        repository
    }

    #[tokio::test]
    async fn test_find_matches_orders_by_priority() {
        let service = TriggerServiceImpl::new(Arc::new(accepting_repository()), client());
        let low = service.create(gag_trigger(1)).await.unwrap();
        let high = service.create(gag_trigger(10)).await.unwrap();
        let off = service.create(gag_trigger(50).disabled()).await.unwrap();

        let matches = service.find_matches(&gag_event()).await;
        let ids: Vec<_> = matches.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![high.id, low.id]);
        assert!(!ids.contains(&off.id));
    }

    #[tokio::test]
    async fn test_toggle_enable_disable() {
        let service = TriggerServiceImpl::new(Arc::new(accepting_repository()), client());
        let trigger = service.create(gag_trigger(0)).await.unwrap();

        assert_eq!(service.toggle_state(trigger.id).await.unwrap(), Some(false));
        assert!(service.find_matches(&gag_event()).await.is_empty());

        assert!(service.enable(trigger.id).await.unwrap());
        assert_eq!(service.find_matches(&gag_event()).await.len(), 1);

        assert!(service.disable(trigger.id).await.unwrap());
        assert!(service.find_matches(&gag_event()).await.is_empty());

        assert_eq!(service.toggle_state(TriggerId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clone_and_delete() {
        let service = TriggerServiceImpl::new(Arc::new(accepting_repository()), client());
        let trigger = service.create(gag_trigger(3)).await.unwrap();

        let copy = service.clone_trigger(trigger.id).await.unwrap().unwrap();
        assert_ne!(copy.id, trigger.id);
        assert_eq!(service.list().await.len(), 2);

        assert!(service.delete(trigger.id).await.unwrap());
        assert!(!service.delete(trigger.id).await.unwrap());
        assert_eq!(service.get(copy.id).await.map(|t| t.priority), Some(3));
    }

    #[tokio::test]
    async fn test_apply_changes_preserves_id() {
        let service = TriggerServiceImpl::new(Arc::new(accepting_repository()), client());
        let trigger = service.create(gag_trigger(0)).await.unwrap();

        let edited = gag_trigger(7).with_description("edited");
        assert!(service.apply_changes(trigger.id, edited).await.unwrap());

        let stored = service.get(trigger.id).await.unwrap();
        assert_eq!(stored.priority, 7);
        assert_eq!(stored.description, "edited");
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_live_list_unchanged() {
        let mut repository = MockTriggerRepositoryPort::new();
        repository
            .expect_save_all()
            .returning(|_| Err(RepositoryError::Storage("read-only".to_string())));
        let service = TriggerServiceImpl::new(Arc::new(repository), client());

        assert!(service.create(gag_trigger(0)).await.is_err());
        assert!(service.list().await.is_empty());
    }

    /// Repository whose save blocks until released
    struct GatedRepository {
        saving: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl TriggerRepositoryPort for GatedRepository {
        async fn load_all(&self) -> Result<Vec<Trigger>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn save_all(&self, _triggers: &[Trigger]) -> Result<(), RepositoryError> {
            self.saving.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_matching_proceeds_while_save_is_pending() {
        let repository = Arc::new(GatedRepository {
            saving: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let service = Arc::new(TriggerServiceImpl::new(repository.clone(), client()));

        let creating = tokio::spawn({
            let service = service.clone();
            async move { service.create(gag_trigger(0)).await }
        });
        repository.saving.notified().await;

        let matches = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            service.find_matches(&gag_event()),
        )
        .await
        .expect("matching blocked behind the save");
        assert!(matches.is_empty());

        repository.release.notify_one();
        creating.await.unwrap().unwrap();
        assert_eq!(service.find_matches(&gag_event()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_collection() {
        let stored = vec![gag_trigger(1), gag_trigger(2)];
        let mut repository = MockTriggerRepositoryPort::new();
        let returned = stored.clone();
        repository
            .expect_load_all()
            .returning(move || Ok(returned.clone()));
        let service = TriggerServiceImpl::new(Arc::new(repository), client());

        assert_eq!(service.reload().await.unwrap(), 2);
        assert_eq!(service.list().await, stored);
    }
}
