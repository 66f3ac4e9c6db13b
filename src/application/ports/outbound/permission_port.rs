//! Permission oracle port
//!
//! The oracle answers whether `performer` may make the local player act on
//! their behalf. It is stateless from the engine's point of view.

use crate::domain::value_objects::UserUid;

#[cfg_attr(test, mockall::automock)]
pub trait PermissionPort: Send + Sync {
    /// Free-text chat relay
    fn can_relay_free_text(&self, performer: &UserUid, target: &UserUid) -> bool;

    /// Emote command relay
    fn can_relay_emote(&self, performer: &UserUid, target: &UserUid) -> bool;

    /// Unrestricted relay of any command
    fn can_relay_all(&self, performer: &UserUid, target: &UserUid) -> bool;
}
