//! Value objects - Immutable objects defined by their attributes

mod devices;
mod identity;
mod ids;
mod restrictions;
mod settings;

pub use devices::{
    MoodleRef, ShockCredential, ShockInstruction, ShockOpCode, ToyInstruction, ToyMotor,
};
pub use identity::{PlayerName, UserUid};
pub use ids::*;
pub use restrictions::{
    ActiveRestraint, GagRef, GagSlot, GagType, ItemRef, NewState, RestrictionSlot,
    RestrictionSnapshot, TimerLock, GAG_SLOT_COUNT, RESTRICTION_SLOT_COUNT,
};
pub use settings::{AutomationSettings, MAX_LOCK_DURATION_SECS};
