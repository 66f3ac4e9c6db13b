//! Restriction vocabulary shared by triggers, actions and the state store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RestraintId, RestrictionId, UserUid};

/// Number of gag layers a player can wear at once
pub const GAG_SLOT_COUNT: usize = 3;

/// Number of generic restriction layers a player can wear at once
pub const RESTRICTION_SLOT_COUNT: usize = 5;

/// A gag from the gag catalog, identified by its catalog name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GagType(String);

impl GagType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either a concrete gag or the wildcard "any gag"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "gag", rename_all = "snake_case")]
pub enum GagRef {
    Any,
    Gag(GagType),
}

impl GagRef {
    pub fn gag(name: impl Into<String>) -> Self {
        Self::Gag(GagType::new(name))
    }

    pub fn matches(&self, gag: &GagType) -> bool {
        match self {
            Self::Any => true,
            Self::Gag(expected) => expected == gag,
        }
    }
}

/// Target state for a toggle-style action or trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewState {
    Enabled,
    Disabled,
}

impl NewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// Timer lock attached to an item applied by the cursed-loot mechanic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerLock {
    pub release_time: DateTime<Utc>,
}

/// One occupied gag layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GagSlot {
    pub gag: GagType,
    pub enactor: UserUid,
    pub lock: Option<TimerLock>,
}

/// One occupied restriction layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionSlot {
    pub restriction_id: RestrictionId,
    pub enactor: UserUid,
    pub lock: Option<TimerLock>,
}

/// The currently worn restraint set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRestraint {
    pub restraint_id: RestraintId,
    pub enactor: UserUid,
}

/// Immutable view of everything currently occupying the player
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestrictionSnapshot {
    pub gags: [Option<GagSlot>; GAG_SLOT_COUNT],
    pub restraint: Option<ActiveRestraint>,
    pub restrictions: [Option<RestrictionSlot>; RESTRICTION_SLOT_COUNT],
}

impl RestrictionSnapshot {
    pub fn first_free_gag_slot(&self) -> Option<usize> {
        self.gags.iter().position(Option::is_none)
    }

    /// Highest-index occupied gag slot matching `gag`
    pub fn outermost_gag_slot(&self, gag: &GagRef) -> Option<usize> {
        self.gags
            .iter()
            .rposition(|slot| slot.as_ref().is_some_and(|s| gag.matches(&s.gag)))
    }

    pub fn is_gag_worn(&self, gag: &GagType) -> bool {
        self.gags.iter().flatten().any(|slot| &slot.gag == gag)
    }

    pub fn first_free_restriction_slot(&self) -> Option<usize> {
        self.restrictions.iter().position(Option::is_none)
    }

    pub fn restriction_slot_of(&self, id: RestrictionId) -> Option<usize> {
        self.restrictions
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.restriction_id == id))
    }

    pub fn is_restraint_active(&self, id: RestraintId) -> bool {
        self.restraint.as_ref().is_some_and(|r| r.restraint_id == id)
    }
}

/// Item referenced by the enable/disable capability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemRef {
    Restraint(RestraintId),
    Restriction(RestrictionId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(gag: &str) -> Option<GagSlot> {
        Some(GagSlot {
            gag: GagType::new(gag),
            enactor: UserUid::new("self"),
            lock: None,
        })
    }

    #[test]
    fn test_outermost_gag_slot_prefers_highest_index() {
        let snapshot = RestrictionSnapshot {
            gags: [slot("Ball Gag"), None, slot("Ball Gag")],
            ..Default::default()
        };

        assert_eq!(snapshot.outermost_gag_slot(&GagRef::Any), Some(2));
        assert_eq!(snapshot.outermost_gag_slot(&GagRef::gag("Ball Gag")), Some(2));
        assert_eq!(snapshot.outermost_gag_slot(&GagRef::gag("Ring Gag")), None);
        assert_eq!(snapshot.first_free_gag_slot(), Some(1));
    }

    #[test]
    fn test_full_gag_slots() {
        let snapshot = RestrictionSnapshot {
            gags: [slot("A"), slot("B"), slot("C")],
            ..Default::default()
        };
        assert_eq!(snapshot.first_free_gag_slot(), None);
        assert!(snapshot.is_gag_worn(&GagType::new("B")));
    }
}
