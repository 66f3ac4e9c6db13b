//! Trigger Dispatch Service - Runs matched trigger actions for published events

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::services::{ActionExecutorService, TriggerService};
use crate::domain::events::AutomationEvent;

pub struct TriggerDispatchService {
    triggers: Arc<dyn TriggerService>,
    executor: Arc<ActionExecutorService>,
}

impl TriggerDispatchService {
    pub fn new(triggers: Arc<dyn TriggerService>, executor: Arc<ActionExecutorService>) -> Self {
        Self { triggers, executor }
    }

    /// Execute every trigger matching `event`, highest priority first.
    /// Returns how many actions succeeded.
    pub async fn dispatch(&self, event: &AutomationEvent) -> usize {
        let matches = self.triggers.find_matches(event).await;
        let performer = self.executor.client_uid().clone();

        let mut succeeded = 0;
        for trigger in &matches {
            if self.executor.execute_action(&trigger.action, &performer).await {
                succeeded += 1;
            } else {
                debug!(trigger_id = %trigger.id, label = %trigger.label, "Trigger action did not apply");
            }
        }
        succeeded
    }

    /// Consume events until the channel closes or `cancel_token` fires
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<AutomationEvent>,
        cancel_token: CancellationToken,
    ) {
        info!("Starting trigger dispatcher");
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            let succeeded = self.dispatch(&event).await;
            debug!(kind = ?event.kind(), succeeded, "Dispatched event");
        }
        info!("Trigger dispatcher shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::application::ports::outbound::{
        MockChatCommandPort, MockDeviceClientPort, MockMoodlePort, MockPermissionPort,
        MockRemoteSessionPort, MockRestrictionStatePort, MockSettingsRepositoryPort,
        MockShockCollarPort, MockTriggerRepositoryPort,
    };
    use crate::application::services::{
        DeviceBridgeService, ExecutorPorts, SettingsService, TriggerServiceImpl,
    };
    use crate::domain::entities::{InvokableAction, SocialTrigger, Trigger, TriggerDetection};
    use crate::domain::events::{SocialGame, SocialResult};
    use crate::domain::value_objects::{AutomationSettings, PlayerName, UserUid};

    fn executor(chat: MockChatCommandPort) -> Arc<ActionExecutorService> {
        let mut repository = MockSettingsRepositoryPort::new();
        repository
            .expect_get()
            .returning(|| Ok(AutomationSettings::default()));
        let settings = Arc::new(SettingsService::new(Arc::new(repository)));
        let mut permissions = MockPermissionPort::new();
        permissions.expect_can_relay_all().return_const(true);

        Arc::new(ActionExecutorService::new(
            UserUid::new("self"),
            ExecutorPorts {
                permissions: Arc::new(permissions),
                state: Arc::new(MockRestrictionStatePort::new()),
                remote: Arc::new(MockRemoteSessionPort::new()),
                moodles: Arc::new(MockMoodlePort::new()),
                shock_collar: Arc::new(MockShockCollarPort::new()),
                devices: Arc::new(DeviceBridgeService::new(
                    Arc::new(MockDeviceClientPort::new()),
                    settings.clone(),
                )),
                chat: Arc::new(chat),
                settings,
            },
        ))
    }

    fn loss_trigger(command: &str, priority: i32) -> Trigger {
        Trigger::new(
            command,
            TriggerDetection::SocialAction(SocialTrigger {
                game: SocialGame::TurnGame,
                result: SocialResult::Loss,
            }),
            InvokableAction::text(command),
        )
        .with_priority(priority)
    }

    async fn registry() -> Arc<TriggerServiceImpl> {
        let mut repository = MockTriggerRepositoryPort::new();
        repository.expect_save_all().returning(|_| Ok(()));
        let service = TriggerServiceImpl::new(Arc::new(repository), PlayerName::new("Self@W"));
        service.create(loss_trigger("/e pouts", 1)).await.unwrap();
        service.create(loss_trigger("/e sulks", 5)).await.unwrap();
        Arc::new(service)
    }

    fn loss() -> AutomationEvent {
        AutomationEvent::SocialGameResult {
            game: SocialGame::TurnGame,
            result: SocialResult::Loss,
            opponent: PlayerName::new("Rival@W"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_runs_matches_in_priority_order() {
        let mut sequence = mockall::Sequence::new();
        let mut chat = MockChatCommandPort::new();
        chat.expect_enqueue_command()
            .withf(|command| command == "/e sulks")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        chat.expect_enqueue_command()
            .withf(|command| command == "/e pouts")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let dispatcher = TriggerDispatchService::new(registry().await, executor(chat));
        assert_eq!(dispatcher.dispatch(&loss()).await, 2);
    }

    #[tokio::test]
    async fn test_run_drains_until_channel_closes() {
        let mut chat = MockChatCommandPort::new();
        chat.expect_enqueue_command().times(2).returning(|_| Ok(()));
        let dispatcher = TriggerDispatchService::new(registry().await, executor(chat));

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(loss()).unwrap();
        drop(tx);
        dispatcher.run(rx, CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mut chat = MockChatCommandPort::new();
        chat.expect_enqueue_command().never();
        let dispatcher = TriggerDispatchService::new(registry().await, executor(chat));

        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        token.cancel();
        tx.send(loss()).unwrap();
        dispatcher.run(rx, token).await;
    }
}
