//! Channel adapters - The event bus and the outbound chat-command channel
//!
//! Both wrap an unbounded mpsc sender so publishing never blocks the caller,
//! including when it runs on the update loop.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::ports::outbound::{ChatCommandPort, ChatError, EventBusPort};
use crate::domain::events::AutomationEvent;

pub struct ChannelEventBus {
    sender: mpsc::UnboundedSender<AutomationEvent>,
}

impl ChannelEventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AutomationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventBusPort for ChannelEventBus {
    fn publish(&self, event: AutomationEvent) {
        if self.sender.send(event).is_err() {
            debug!("Event bus has no consumer, dropping event");
        }
    }
}

/// Commands queued for the local player's chat box
pub struct ChannelChatCommands {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelChatCommands {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ChatCommandPort for ChannelChatCommands {
    fn enqueue_command(&self, command: String) -> Result<(), ChatError> {
        self.sender.send(command).map_err(|e| {
            warn!(command = %e.0, "Chat command channel closed");
            ChatError::ChannelClosed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{SocialGame, SocialResult};
    use crate::domain::value_objects::PlayerName;

    #[tokio::test]
    async fn test_event_bus_delivers_in_order() {
        let (bus, mut events) = ChannelEventBus::new();
        for result in [SocialResult::Win, SocialResult::Loss] {
            bus.publish(AutomationEvent::SocialGameResult {
                game: SocialGame::TurnGame,
                result,
                opponent: PlayerName::new("Rival@W"),
            });
        }

        let first = events.recv().await.unwrap();
        assert!(matches!(first, AutomationEvent::SocialGameResult { result: SocialResult::Win, .. }));
        let second = events.recv().await.unwrap();
        assert!(matches!(second, AutomationEvent::SocialGameResult { result: SocialResult::Loss, .. }));
    }

    #[test]
    fn test_closed_chat_channel_reports_error() {
        let (chat, commands) = ChannelChatCommands::new();
        assert!(chat.enqueue_command("/e waves".to_string()).is_ok());
        drop(commands);
        assert_eq!(
            chat.enqueue_command("/e waves".to_string()),
            Err(ChatError::ChannelClosed)
        );
    }
}
