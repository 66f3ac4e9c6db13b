//! Static permission oracle
//!
//! Grants are configured per performer and apply to any target. The pairing
//! network that normally supplies them is outside this crate.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::PermissionPort;
use crate::domain::value_objects::UserUid;

/// Relay categories one performer may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayGrant {
    pub free_text: bool,
    pub emote: bool,
    pub all: bool,
}

impl RelayGrant {
    pub fn full() -> Self {
        Self {
            free_text: true,
            emote: true,
            all: true,
        }
    }
}

#[derive(Default)]
pub struct StaticPermissionOracle {
    grants: RwLock<HashMap<UserUid, RelayGrant>>,
}

impl StaticPermissionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, performer: UserUid, grant: RelayGrant) {
        if let Ok(mut grants) = self.grants.write() {
            grants.insert(performer, grant);
        }
    }

    pub fn revoke(&self, performer: &UserUid) {
        if let Ok(mut grants) = self.grants.write() {
            grants.remove(performer);
        }
    }

    fn grant_for(&self, performer: &UserUid) -> RelayGrant {
        self.grants
            .read()
            .ok()
            .and_then(|grants| grants.get(performer).copied())
            .unwrap_or_default()
    }
}

impl PermissionPort for StaticPermissionOracle {
    fn can_relay_free_text(&self, performer: &UserUid, _target: &UserUid) -> bool {
        self.grant_for(performer).free_text
    }

    fn can_relay_emote(&self, performer: &UserUid, _target: &UserUid) -> bool {
        self.grant_for(performer).emote
    }

    fn can_relay_all(&self, performer: &UserUid, _target: &UserUid) -> bool {
        self.grant_for(performer).all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_performer_is_denied() {
        let oracle = StaticPermissionOracle::new();
        let owner = UserUid::new("owner");
        let me = UserUid::new("self");
        assert!(!oracle.can_relay_free_text(&owner, &me));

        oracle.grant(
            owner.clone(),
            RelayGrant {
                emote: true,
                ..Default::default()
            },
        );
        assert!(oracle.can_relay_emote(&owner, &me));
        assert!(!oracle.can_relay_all(&owner, &me));

        oracle.revoke(&owner);
        assert!(!oracle.can_relay_emote(&owner, &me));
    }
}
