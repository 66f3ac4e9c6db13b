//! Automation events - Things observed in the game or session that triggers react to
//!
//! Events are produced by session trackers, game hooks and the restriction
//! state store, and consumed by the trigger dispatcher.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    GagType, NewState, PlayerName, RestraintId, RestrictionId, UserUid,
};

/// Discriminant shared by events and trigger detection payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    SpellAction,
    HealthPercent,
    GagState,
    RestraintState,
    RestrictionState,
    SocialAction,
    Emote,
}

/// Category of a resolved combat action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellActionKind {
    Damage,
    Heal,
    Miss,
    Interrupted,
    CastStarted,
}

/// Social mini-games whose results can be reacted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialGame {
    TurnGame,
}

/// Outcome of a social game from the local player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialResult {
    Win,
    Loss,
}

/// All events the trigger registry can match against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationEvent {
    /// A combat action resolved between two actors
    SpellAction {
        kind: SpellActionKind,
        action_id: u32,
        source: PlayerName,
        target: PlayerName,
        /// Damage or heal amount; zero for kinds without a value
        amount: i32,
    },

    /// A tracked player's health changed
    HealthChanged {
        player: PlayerName,
        previous_hp: u32,
        current_hp: u32,
        max_hp: u32,
    },

    /// A gag layer changed on the local player
    GagStateChanged {
        gag: GagType,
        slot: usize,
        new_state: NewState,
        enactor: UserUid,
    },

    /// The worn restraint set changed
    RestraintStateChanged {
        restraint_id: RestraintId,
        new_state: NewState,
        enactor: UserUid,
    },

    /// A generic restriction layer changed
    RestrictionStateChanged {
        restriction_id: RestrictionId,
        slot: usize,
        new_state: NewState,
        enactor: UserUid,
    },

    /// A social game the local player took part in finished
    SocialGameResult {
        game: SocialGame,
        result: SocialResult,
        opponent: PlayerName,
    },

    /// An emote was performed
    Emote {
        emote_id: u16,
        source: PlayerName,
        target: Option<PlayerName>,
    },
}

impl AutomationEvent {
    pub fn kind(&self) -> DetectionKind {
        match self {
            Self::SpellAction { .. } => DetectionKind::SpellAction,
            Self::HealthChanged { .. } => DetectionKind::HealthPercent,
            Self::GagStateChanged { .. } => DetectionKind::GagState,
            Self::RestraintStateChanged { .. } => DetectionKind::RestraintState,
            Self::RestrictionStateChanged { .. } => DetectionKind::RestrictionState,
            Self::SocialGameResult { .. } => DetectionKind::SocialAction,
            Self::Emote { .. } => DetectionKind::Emote,
        }
    }
}
