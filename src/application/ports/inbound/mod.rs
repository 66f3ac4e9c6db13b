//! Inbound ports - Event sources the application listens to
//!
//! - Chat feed: raw lines with a sender, consumed by the turn-game tracker
//! - World-interaction hook: observed (never suppressed) interaction calls

use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::GameWorldPort;
use crate::domain::value_objects::PlayerName;

/// One inbound chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub sender: PlayerName,
    pub message: String,
}

impl ChatLine {
    pub fn new(sender: PlayerName, message: impl Into<String>) -> Self {
        Self {
            sender,
            message: message.into(),
        }
    }
}

/// Kind of the object targeted by a world interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Player,
    BattleNpc,
    EventNpc,
    Treasure,
    EventObj,
    Other,
}

/// Arguments of an intercepted interaction call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTarget {
    pub object_kind: ObjectKind,
    pub object_id: u64,
    pub check_line_of_sight: bool,
}

/// Observer of the world-interaction hook; runs on the update loop
pub trait InteractionObserver: Send + Sync {
    fn on_interaction(
        &self,
        target: &InteractionTarget,
        world: &dyn GameWorldPort,
    ) -> anyhow::Result<()>;
}
