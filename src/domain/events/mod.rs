//! Domain events

mod automation_events;

pub use automation_events::{
    AutomationEvent, DetectionKind, SocialGame, SocialResult, SpellActionKind,
};
