//! Restriction state store port
//!
//! The store is the live record of gags, the worn restraint set and restriction
//! layers. Only the action executor and the cursed-loot service mutate it;
//! everyone else reads snapshots.

use crate::domain::value_objects::{
    GagType, ItemRef, RestraintId, RestrictionId, RestrictionSnapshot, TimerLock, UserUid,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("Slot {0} is already occupied")]
    SlotOccupied(usize),
    #[error("Slot {0} is empty")]
    SlotEmpty(usize),
    #[error("Item is locked: {0}")]
    Locked(String),
    #[error("Restraint {0} is not active")]
    RestraintNotActive(RestraintId),
    #[error("A restraint set is already active")]
    RestraintAlreadyActive,
    #[error("No restraint set is active")]
    NoActiveRestraint,
}

#[cfg_attr(test, mockall::automock)]
pub trait RestrictionStatePort: Send + Sync {
    fn snapshot(&self) -> RestrictionSnapshot;

    fn apply_gag(
        &self,
        slot: usize,
        gag: GagType,
        enactor: &UserUid,
        lock: Option<TimerLock>,
    ) -> Result<(), StateError>;

    fn remove_gag(&self, slot: usize, enactor: &UserUid) -> Result<GagType, StateError>;

    /// Apply a restraint set when none is worn
    fn apply_restraint(&self, restraint_id: RestraintId, enactor: &UserUid) -> Result<(), StateError>;

    /// Replace the worn restraint set
    fn swap_restraint(&self, restraint_id: RestraintId, enactor: &UserUid) -> Result<(), StateError>;

    fn disable_restraint(&self, restraint_id: RestraintId, enactor: &UserUid) -> Result<(), StateError>;

    fn apply_restriction(
        &self,
        slot: usize,
        restriction_id: RestrictionId,
        enactor: &UserUid,
        lock: Option<TimerLock>,
    ) -> Result<(), StateError>;

    fn remove_restriction(&self, slot: usize, enactor: &UserUid) -> Result<RestrictionId, StateError>;

    /// Conflicts and hardcore locks permit enabling `item` right now
    fn can_enable(&self, item: ItemRef) -> bool;

    /// Locks permit disabling `item` right now
    fn can_disable(&self, item: ItemRef) -> bool;
}
