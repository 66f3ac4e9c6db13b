//! Cursed loot - Items that may be attached to the player when a container opens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    CursedItemId, GagType, RestrictionId, RestrictionSnapshot,
};

/// What a cursed item puts on the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "ref", rename_all = "snake_case")]
pub enum CursedRestriction {
    Gag(GagType),
    Restriction(RestrictionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursedItem {
    pub id: CursedItemId,
    pub label: String,
    pub restriction: CursedRestriction,
}

impl CursedItem {
    pub fn gag(label: impl Into<String>, gag: GagType) -> Self {
        Self {
            id: CursedItemId::new(),
            label: label.into(),
            restriction: CursedRestriction::Gag(gag),
        }
    }

    pub fn restriction(label: impl Into<String>, restriction_id: RestrictionId) -> Self {
        Self {
            id: CursedItemId::new(),
            label: label.into(),
            restriction: CursedRestriction::Restriction(restriction_id),
        }
    }

    /// True when the same thing already occupies the player
    pub fn is_worn(&self, snapshot: &RestrictionSnapshot) -> bool {
        match &self.restriction {
            CursedRestriction::Gag(gag) => snapshot.is_gag_worn(gag),
            CursedRestriction::Restriction(id) => snapshot.restriction_slot_of(*id).is_some(),
        }
    }
}

/// A cursed item currently applied to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCursedItem {
    pub item: CursedItem,
    pub applied_time: DateTime<Utc>,
    pub release_time: DateTime<Utc>,
}

/// Candidates partitioned into eligible (inactive) and applied (active)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootPool {
    inactive: Vec<CursedItem>,
    active: Vec<ActiveCursedItem>,
}

impl LootPool {
    pub fn new(items: impl IntoIterator<Item = CursedItem>) -> Self {
        Self {
            inactive: items.into_iter().collect(),
            active: Vec::new(),
        }
    }

    pub fn inactive(&self) -> &[CursedItem] {
        &self.inactive
    }

    pub fn active(&self) -> &[ActiveCursedItem] {
        &self.active
    }

    pub fn has_inactive(&self) -> bool {
        !self.inactive.is_empty()
    }

    pub fn add_item(&mut self, item: CursedItem) {
        self.inactive.push(item);
    }

    /// Remove an inactive item; active items cannot be removed
    pub fn remove_item(&mut self, id: CursedItemId) -> bool {
        let before = self.inactive.len();
        self.inactive.retain(|item| item.id != id);
        before != self.inactive.len()
    }

    /// Inactive gag items whose gag is not already worn
    pub fn gag_candidates(&self, snapshot: &RestrictionSnapshot) -> Vec<CursedItem> {
        self.inactive
            .iter()
            .filter(|item| matches!(item.restriction, CursedRestriction::Gag(_)))
            .filter(|item| !item.is_worn(snapshot))
            .cloned()
            .collect()
    }

    /// Inactive restriction items not occupying any restriction slot
    pub fn restriction_candidates(&self, snapshot: &RestrictionSnapshot) -> Vec<CursedItem> {
        self.inactive
            .iter()
            .filter(|item| matches!(item.restriction, CursedRestriction::Restriction(_)))
            .filter(|item| !item.is_worn(snapshot))
            .cloned()
            .collect()
    }

    /// Move an inactive item into the active partition
    pub fn activate(
        &mut self,
        id: CursedItemId,
        applied_time: DateTime<Utc>,
        release_time: DateTime<Utc>,
    ) -> bool {
        let Some(index) = self.inactive.iter().position(|item| item.id == id) else {
            return false;
        };
        let item = self.inactive.remove(index);
        self.active.push(ActiveCursedItem {
            item,
            applied_time,
            release_time,
        });
        true
    }

    /// Active items whose release time has passed
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<ActiveCursedItem> {
        self.active
            .iter()
            .filter(|active| active.release_time <= now)
            .cloned()
            .collect()
    }

    /// Move an active item back into the inactive set
    pub fn release(&mut self, id: CursedItemId) -> Option<ActiveCursedItem> {
        let index = self.active.iter().position(|active| active.item.id == id)?;
        let released = self.active.remove(index);
        self.inactive.push(released.item.clone());
        Some(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::domain::value_objects::{GagSlot, UserUid};

    #[test]
    fn test_worn_gag_is_not_a_candidate() {
        let pool = LootPool::new([
            CursedItem::gag("Cursed ball gag", GagType::new("Ball Gag")),
            CursedItem::gag("Cursed ring gag", GagType::new("Ring Gag")),
            CursedItem::restriction("Cursed cuffs", RestrictionId::new()),
        ]);
        let snapshot = RestrictionSnapshot {
            gags: [
                Some(GagSlot {
                    gag: GagType::new("Ball Gag"),
                    enactor: UserUid::new("self"),
                    lock: None,
                }),
                None,
                None,
            ],
            ..Default::default()
        };

        let gags = pool.gag_candidates(&snapshot);
        assert_eq!(gags.len(), 1);
        assert_eq!(gags[0].label, "Cursed ring gag");
        assert_eq!(pool.restriction_candidates(&snapshot).len(), 1);
    }

    #[test]
    fn test_activate_and_release() {
        let item = CursedItem::gag("Cursed gag", GagType::new("Ball Gag"));
        let id = item.id;
        let mut pool = LootPool::new([item]);
        let now = Utc::now();

        assert!(pool.activate(id, now, now + Duration::minutes(10)));
        assert!(!pool.has_inactive());
        assert!(!pool.activate(id, now, now));
        assert!(!pool.remove_item(id));

        assert!(pool.expired(now + Duration::minutes(5)).is_empty());
        let expired = pool.expired(now + Duration::minutes(10));
        assert_eq!(expired.len(), 1);
        assert_eq!(pool.active().len(), 1);

        assert!(pool.release(id).is_some());
        assert!(pool.release(id).is_none());
        assert!(pool.has_inactive());
        assert!(pool.active().is_empty());
    }
}
