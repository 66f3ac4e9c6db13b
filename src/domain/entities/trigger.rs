//! Trigger entity - A configured binding from a detection condition to an action
//!
//! The detection payload is a closed sum type, so a trigger always carries
//! exactly one payload and its `DetectionKind` is derived from it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::InvokableAction;
use crate::domain::events::{
    AutomationEvent, DetectionKind, SocialGame, SocialResult, SpellActionKind,
};
use crate::domain::value_objects::{
    GagRef, NewState, PlayerName, RestraintId, RestrictionId, TriggerId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub enabled: bool,
    /// Higher fires first
    pub priority: i32,
    pub label: String,
    pub description: String,
    pub detection: TriggerDetection,
    pub action: InvokableAction,
}

impl Trigger {
    pub fn new(label: impl Into<String>, detection: TriggerDetection, action: InvokableAction) -> Self {
        Self {
            id: TriggerId::new(),
            enabled: true,
            priority: 0,
            label: label.into(),
            description: String::new(),
            detection,
            action,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn kind(&self) -> DetectionKind {
        self.detection.kind()
    }

    /// Check whether this trigger reacts to `event`, as seen by `client`
    pub fn matches(&self, event: &AutomationEvent, client: &PlayerName) -> bool {
        self.enabled && self.detection.matches(event, client)
    }

    /// Overwrite everything except the identifier with `edited`
    pub fn apply_changes(&mut self, edited: &Trigger) {
        let id = self.id;
        *self = edited.clone();
        self.id = id;
    }

    /// Deep copy under a fresh identifier
    pub fn duplicate(&self) -> Trigger {
        Trigger {
            id: TriggerId::new(),
            label: format!("{} (Copy)", self.label),
            ..self.clone()
        }
    }

    /// Priority descending, then identifier ascending
    pub fn dispatch_order(a: &Trigger, b: &Trigger) -> Ordering {
        b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id))
    }
}

/// Detection payload, one variant per `DetectionKind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detection", rename_all = "snake_case")]
pub enum TriggerDetection {
    SpellAction(SpellActionTrigger),
    HealthPercent(HealthPercentTrigger),
    GagState(GagTrigger),
    RestraintState(RestraintTrigger),
    RestrictionState(RestrictionTrigger),
    SocialAction(SocialTrigger),
    Emote(EmoteTrigger),
}

impl TriggerDetection {
    pub fn kind(&self) -> DetectionKind {
        match self {
            Self::SpellAction(_) => DetectionKind::SpellAction,
            Self::HealthPercent(_) => DetectionKind::HealthPercent,
            Self::GagState(_) => DetectionKind::GagState,
            Self::RestraintState(_) => DetectionKind::RestraintState,
            Self::RestrictionState(_) => DetectionKind::RestrictionState,
            Self::SocialAction(_) => DetectionKind::SocialAction,
            Self::Emote(_) => DetectionKind::Emote,
        }
    }

    pub fn matches(&self, event: &AutomationEvent, client: &PlayerName) -> bool {
        match (self, event) {
            (
                Self::SpellAction(t),
                AutomationEvent::SpellAction {
                    kind,
                    action_id,
                    source,
                    target,
                    amount,
                },
            ) => {
                t.kind == *kind
                    && (t.is_generic || t.action_ids.contains(action_id))
                    && t.direction.allows(source, Some(target), client)
                    && t.threshold.contains(i64::from(*amount))
            }
            (
                Self::HealthPercent(t),
                AutomationEvent::HealthChanged {
                    player,
                    previous_hp,
                    current_hp,
                    max_hp,
                },
            ) => t.player == *player && t.is_crossed(*previous_hp, *current_hp, *max_hp),
            (
                Self::GagState(t),
                AutomationEvent::GagStateChanged { gag, new_state, .. },
            ) => t.gag.matches(gag) && t.new_state == *new_state,
            (
                Self::RestraintState(t),
                AutomationEvent::RestraintStateChanged {
                    restraint_id,
                    new_state,
                    ..
                },
            ) => t.restraint_id == *restraint_id && t.new_state == *new_state,
            (
                Self::RestrictionState(t),
                AutomationEvent::RestrictionStateChanged {
                    restriction_id,
                    new_state,
                    ..
                },
            ) => t.restriction_id == *restriction_id && t.new_state == *new_state,
            (
                Self::SocialAction(t),
                AutomationEvent::SocialGameResult { game, result, .. },
            ) => t.game == *game && t.result == *result,
            (
                Self::Emote(t),
                AutomationEvent::Emote {
                    emote_id,
                    source,
                    target,
                },
            ) => t.emote_id == *emote_id && t.allows(source, target.as_ref(), client),
            _ => false,
        }
    }
}

/// Which side of an action the local player must be on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerDirection {
    /// Performed by the local player, any target
    #[serde(rename = "self")]
    FromSelf,
    /// Performed by someone else, any target
    #[serde(rename = "other")]
    FromOther,
    SelfToOther,
    OtherToSelf,
    Any,
}

impl TriggerDirection {
    pub fn allows(&self, source: &PlayerName, target: Option<&PlayerName>, client: &PlayerName) -> bool {
        let from_self = source == client;
        let target_self = target.is_some_and(|t| t == client);
        match self {
            Self::FromSelf => from_self,
            Self::FromOther => !from_self,
            Self::SelfToOther => from_self && target.is_some() && !target_self,
            Self::OtherToSelf => !from_self && target_self,
            Self::Any => true,
        }
    }
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub min: i64,
    pub max: i64,
}

impl ThresholdRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellActionTrigger {
    pub kind: SpellActionKind,
    pub direction: TriggerDirection,
    /// When set, any action of `kind` qualifies and `action_ids` is ignored
    pub is_generic: bool,
    pub action_ids: Vec<u32>,
    pub threshold: ThresholdRange,
}

/// Which way a health value must travel into the threshold range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPassType {
    Under,
    Over,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPercentTrigger {
    pub player: PlayerName,
    /// Compare percent of max health rather than absolute points
    pub use_percentage: bool,
    pub pass_type: ThresholdPassType,
    pub threshold: ThresholdRange,
}

impl HealthPercentTrigger {
    fn value(&self, hp: u32, max_hp: u32) -> Option<i64> {
        if !self.use_percentage {
            return Some(i64::from(hp));
        }
        if max_hp == 0 {
            return None;
        }
        Some(i64::from(hp) * 100 / i64::from(max_hp))
    }

    /// True when the value entered the range from the side `pass_type` names
    pub fn is_crossed(&self, previous_hp: u32, current_hp: u32, max_hp: u32) -> bool {
        let (Some(previous), Some(current)) =
            (self.value(previous_hp, max_hp), self.value(current_hp, max_hp))
        else {
            return false;
        };
        if !self.threshold.contains(current) {
            return false;
        }
        match self.pass_type {
            ThresholdPassType::Under => previous > self.threshold.max,
            ThresholdPassType::Over => previous < self.threshold.min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GagTrigger {
    pub gag: GagRef,
    pub new_state: NewState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestraintTrigger {
    pub restraint_id: RestraintId,
    pub new_state: NewState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionTrigger {
    pub restriction_id: RestrictionId,
    pub new_state: NewState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialTrigger {
    pub game: SocialGame,
    pub result: SocialResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteTrigger {
    pub emote_id: u16,
    pub direction: TriggerDirection,
    /// Restricts the other party of the emote when set
    pub counterpart: Option<PlayerName>,
}

impl EmoteTrigger {
    fn allows(&self, source: &PlayerName, target: Option<&PlayerName>, client: &PlayerName) -> bool {
        if !self.direction.allows(source, target, client) {
            return false;
        }
        let Some(counterpart) = &self.counterpart else {
            return true;
        };
        if source == client {
            target.is_some_and(|t| t == counterpart)
        } else {
            source == counterpart
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{GagType, UserUid};

    fn me() -> PlayerName {
        PlayerName::new("Alia Fenn@Lamia")
    }

    fn other() -> PlayerName {
        PlayerName::new("Rook Vael@Lamia")
    }

    fn gag_trigger(gag: GagRef, new_state: NewState) -> Trigger {
        Trigger::new(
            "gag",
            TriggerDetection::GagState(GagTrigger { gag, new_state }),
            InvokableAction::text("/e struggles"),
        )
    }

    fn gag_event(gag: &str, new_state: NewState) -> AutomationEvent {
        AutomationEvent::GagStateChanged {
            gag: GagType::new(gag),
            slot: 0,
            new_state,
            enactor: UserUid::new("self"),
        }
    }

    fn spell(kind: SpellActionKind, action_id: u32, source: PlayerName, target: PlayerName, amount: i32) -> AutomationEvent {
        AutomationEvent::SpellAction {
            kind,
            action_id,
            source,
            target,
            amount,
        }
    }

    #[test]
    fn test_disabled_trigger_never_matches() {
        let trigger = gag_trigger(GagRef::Any, NewState::Enabled).disabled();
        assert!(!trigger.matches(&gag_event("Ball Gag", NewState::Enabled), &me()));
        assert!(trigger.detection.matches(&gag_event("Ball Gag", NewState::Enabled), &me()));
    }

    #[test]
    fn test_gag_trigger_matching() {
        let trigger = gag_trigger(GagRef::gag("Ball Gag"), NewState::Enabled);
        assert!(trigger.matches(&gag_event("Ball Gag", NewState::Enabled), &me()));
        assert!(!trigger.matches(&gag_event("Ball Gag", NewState::Disabled), &me()));
        assert!(!trigger.matches(&gag_event("Ring Gag", NewState::Enabled), &me()));
    }

    #[test]
    fn test_kind_mismatch_never_matches() {
        let trigger = gag_trigger(GagRef::Any, NewState::Enabled);
        let event = AutomationEvent::SocialGameResult {
            game: SocialGame::TurnGame,
            result: SocialResult::Loss,
            opponent: other(),
        };
        assert!(!trigger.matches(&event, &me()));
    }

    #[test]
    fn test_spell_action_direction_and_threshold() {
        let trigger = Trigger::new(
            "big hits",
            TriggerDetection::SpellAction(SpellActionTrigger {
                kind: SpellActionKind::Damage,
                direction: TriggerDirection::OtherToSelf,
                is_generic: true,
                action_ids: vec![],
                threshold: ThresholdRange::new(5000, 20000),
            }),
            InvokableAction::text("/e winces"),
        );

        assert!(trigger.matches(&spell(SpellActionKind::Damage, 7, other(), me(), 6000), &me()));
        assert!(!trigger.matches(&spell(SpellActionKind::Damage, 7, other(), me(), 100), &me()));
        assert!(!trigger.matches(&spell(SpellActionKind::Damage, 7, me(), other(), 6000), &me()));
        assert!(!trigger.matches(&spell(SpellActionKind::Heal, 7, other(), me(), 6000), &me()));
    }

    #[test]
    fn test_spell_action_specific_ids() {
        let trigger = Trigger::new(
            "specific",
            TriggerDetection::SpellAction(SpellActionTrigger {
                kind: SpellActionKind::CastStarted,
                direction: TriggerDirection::Any,
                is_generic: false,
                action_ids: vec![16, 24],
                threshold: ThresholdRange::unbounded(),
            }),
            InvokableAction::text("/e flinches"),
        );

        assert!(trigger.matches(&spell(SpellActionKind::CastStarted, 24, other(), other(), 0), &me()));
        assert!(!trigger.matches(&spell(SpellActionKind::CastStarted, 25, other(), other(), 0), &me()));
    }

    #[test]
    fn test_direction_table() {
        let client = me();
        assert!(TriggerDirection::FromSelf.allows(&me(), Some(&me()), &client));
        assert!(TriggerDirection::SelfToOther.allows(&me(), Some(&other()), &client));
        assert!(!TriggerDirection::SelfToOther.allows(&me(), Some(&me()), &client));
        assert!(!TriggerDirection::SelfToOther.allows(&me(), None, &client));
        assert!(TriggerDirection::FromOther.allows(&other(), None, &client));
        assert!(TriggerDirection::OtherToSelf.allows(&other(), Some(&me()), &client));
        assert!(!TriggerDirection::OtherToSelf.allows(&other(), Some(&other()), &client));
        assert!(TriggerDirection::Any.allows(&other(), None, &client));
    }

    #[test]
    fn test_health_trigger_crossing() {
        let under = HealthPercentTrigger {
            player: me(),
            use_percentage: true,
            pass_type: ThresholdPassType::Under,
            threshold: ThresholdRange::new(0, 25),
        };
        assert!(under.is_crossed(5000, 2000, 10000));
        assert!(!under.is_crossed(2400, 2000, 10000));
        assert!(!under.is_crossed(9000, 8000, 10000));
        assert!(!under.is_crossed(9000, 2000, 0));

        let over = HealthPercentTrigger {
            player: me(),
            use_percentage: false,
            pass_type: ThresholdPassType::Over,
            threshold: ThresholdRange::new(50000, 60000),
        };
        assert!(over.is_crossed(10000, 55000, 60000));
        assert!(!over.is_crossed(52000, 55000, 60000));
    }

    #[test]
    fn test_health_trigger_requires_named_player() {
        let trigger = Trigger::new(
            "low health",
            TriggerDetection::HealthPercent(HealthPercentTrigger {
                player: other(),
                use_percentage: true,
                pass_type: ThresholdPassType::Under,
                threshold: ThresholdRange::new(0, 50),
            }),
            InvokableAction::text("/e worries"),
        );
        let own = AutomationEvent::HealthChanged {
            player: me(),
            previous_hp: 100,
            current_hp: 10,
            max_hp: 100,
        };
        let theirs = AutomationEvent::HealthChanged {
            player: other(),
            previous_hp: 100,
            current_hp: 10,
            max_hp: 100,
        };
        assert!(!trigger.matches(&own, &me()));
        assert!(trigger.matches(&theirs, &me()));
    }

    #[test]
    fn test_emote_counterpart() {
        let trigger = EmoteTrigger {
            emote_id: 105,
            direction: TriggerDirection::OtherToSelf,
            counterpart: Some(other()),
        };
        assert!(trigger.allows(&other(), Some(&me()), &me()));
        assert!(!trigger.allows(&PlayerName::new("Someone@Else"), Some(&me()), &me()));
    }

    #[test]
    fn test_apply_changes_keeps_id() {
        let mut original = gag_trigger(GagRef::Any, NewState::Enabled);
        let edited = gag_trigger(GagRef::gag("Ring Gag"), NewState::Disabled).with_priority(9);
        let id = original.id;

        original.apply_changes(&edited);

        assert_eq!(original.id, id);
        assert_eq!(original.priority, 9);
        assert_eq!(original.detection, edited.detection);
    }

    #[test]
    fn test_duplicate_is_deep_copy_with_new_id() {
        let original = gag_trigger(GagRef::Any, NewState::Enabled);
        let mut copy = original.duplicate();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.action, original.action);

        copy.action = InvokableAction::text("/e changed");
        assert_eq!(original.action, InvokableAction::text("/e struggles"));
    }

    #[test]
    fn test_dispatch_order() {
        let low = gag_trigger(GagRef::Any, NewState::Enabled).with_priority(1);
        let high = gag_trigger(GagRef::Any, NewState::Enabled).with_priority(5);
        let mut triggers = vec![low.clone(), high.clone()];
        triggers.sort_by(Trigger::dispatch_order);
        assert_eq!(triggers[0].id, high.id);

        let a = gag_trigger(GagRef::Any, NewState::Enabled);
        let b = gag_trigger(GagRef::Any, NewState::Enabled);
        let expected = if a.id < b.id { a.id } else { b.id };
        let mut tied = vec![a, b];
        tied.sort_by(Trigger::dispatch_order);
        assert_eq!(tied[0].id, expected);
    }
}
