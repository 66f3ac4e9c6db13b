//! Domain entities - Core automation objects with identity

mod cursed_item;
mod invokable_action;
mod trigger;
mod turn_game;

pub use cursed_item::{ActiveCursedItem, CursedItem, CursedRestriction, LootPool};
pub use invokable_action::InvokableAction;
pub use trigger::{
    EmoteTrigger, GagTrigger, HealthPercentTrigger, RestraintTrigger, RestrictionTrigger,
    SocialTrigger, SpellActionTrigger, ThresholdPassType, ThresholdRange, Trigger,
    TriggerDetection, TriggerDirection,
};
pub use turn_game::{RollMessage, TurnGameSession, TurnGameState};
