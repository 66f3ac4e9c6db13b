//! Cursed Loot Service - Timed restrictions attached to opened loot containers
//!
//! The service observes world interactions on the update loop. A qualifying
//! interaction schedules one delayed confirmation task; the task re-checks the
//! loot table on the update loop and, when confirmed, rolls for a cursed item.
//!
//! Two guards suppress duplicates in different windows: the in-flight flag
//! while a confirmation is pending, and the last-opened object id afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::inbound::{InteractionObserver, InteractionTarget, ObjectKind};
use crate::application::ports::outbound::{
    ClockPort, FrameworkPort, GameWorldPort, RandomPort, RemoteSessionPort, RestrictionStatePort,
    StateUpdate,
};
use crate::application::services::SettingsService;
use crate::domain::entities::{ActiveCursedItem, CursedItem, CursedRestriction, LootPool};
use crate::domain::value_objects::{
    AutomationSettings, CursedItemId, TimerLock, UserUid,
};

/// Collaborators of the cursed-loot mechanic
#[derive(Clone)]
pub struct CursedLootPorts {
    pub state: Arc<dyn RestrictionStatePort>,
    pub remote: Arc<dyn RemoteSessionPort>,
    pub framework: Arc<dyn FrameworkPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
    pub settings: Arc<SettingsService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LootContainer {
    Treasure,
    DeepDungeonCoffer,
}

struct Shared {
    client_uid: UserUid,
    ports: CursedLootPorts,
    pool: Mutex<LootPool>,
    last_opened: Mutex<Option<u64>>,
    in_flight: AtomicBool,
}

#[derive(Clone)]
pub struct CursedLootService {
    shared: Arc<Shared>,
    runtime: Handle,
}

/// Clears the in-flight flag however the confirmation task ends
struct InFlightGuard(Arc<Shared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

impl CursedLootService {
    /// `runtime` hosts confirmation tasks spawned from the update loop
    pub fn new(client_uid: UserUid, ports: CursedLootPorts, pool: LootPool, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                client_uid,
                ports,
                pool: Mutex::new(pool),
                last_opened: Mutex::new(None),
                in_flight: AtomicBool::new(false),
            }),
            runtime,
        }
    }

    pub fn pool(&self) -> LootPool {
        self.shared.lock_pool().clone()
    }

    pub fn add_item(&self, item: CursedItem) {
        info!(item = %item.label, "Added cursed loot candidate");
        self.shared.lock_pool().add_item(item);
    }

    /// Remove an inactive candidate; applied items stay until released
    pub fn remove_item(&self, id: CursedItemId) -> bool {
        self.shared.lock_pool().remove_item(id)
    }

    pub fn is_confirmation_pending(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub fn last_opened(&self) -> Option<u64> {
        *self
            .shared
            .last_opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Roll for and apply one cursed item; returns the applied item
    pub async fn apply_cursed_loot(&self) -> Option<CursedItem> {
        self.shared.apply_cursed_loot().await
    }

    /// Take expired items off the player and return them to the pool.
    /// An item whose removal fails stays active and is retried on the next sweep.
    #[instrument(skip(self))]
    pub async fn release_expired(&self, now: DateTime<Utc>) -> Vec<ActiveCursedItem> {
        let expired = self.shared.lock_pool().expired(now);
        let mut released = Vec::with_capacity(expired.len());
        for active in expired {
            if !self.shared.take_off(&active.item).await {
                debug!(item = %active.item.label, "Expired item stays active");
                continue;
            }
            let item = self.shared.lock_pool().release(active.item.id);
            released.extend(item);
        }
        if !released.is_empty() {
            info!(count = released.len(), "Released expired cursed items");
        }
        released
    }

    fn classify(target: &InteractionTarget, world: &dyn GameWorldPort) -> Option<LootContainer> {
        match target.object_kind {
            ObjectKind::Treasure => Some(LootContainer::Treasure),
            ObjectKind::EventObj if world.is_deep_dungeon_coffer(target.object_id) => {
                Some(LootContainer::DeepDungeonCoffer)
            }
            _ => None,
        }
    }
}

impl InteractionObserver for CursedLootService {
    fn on_interaction(
        &self,
        target: &InteractionTarget,
        world: &dyn GameWorldPort,
    ) -> anyhow::Result<()> {
        let Some(container) = Self::classify(target, world) else {
            return Ok(());
        };
        let object_id = target.object_id;
        let shared = &self.shared;

        let settings = shared.ports.settings.current();
        if !settings.cursed_loot_enabled {
            return Ok(());
        }
        if !shared.lock_pool().has_inactive() {
            debug!("No inactive cursed items");
            return Ok(());
        }
        if !shared.ports.remote.is_connected() {
            debug!("Remote session offline, skipping cursed loot");
            return Ok(());
        }
        if self.last_opened() == Some(object_id) {
            debug!(object_id, "Container was already opened");
            return Ok(());
        }
        if shared
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(object_id, "Confirmation already in flight");
            return Ok(());
        }

        debug!(object_id, ?container, "Scheduling loot confirmation");
        let guard = InFlightGuard(shared.clone());
        let shared = shared.clone();
        self.runtime.spawn(async move {
            let _guard = guard;
            shared
                .confirm_and_apply(container, object_id, settings)
                .await;
        });
        Ok(())
    }
}

impl Shared {
    fn lock_pool(&self) -> std::sync::MutexGuard<'_, LootPool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn confirm_and_apply(
        &self,
        container: LootContainer,
        object_id: u64,
        settings: AutomationSettings,
    ) {
        tokio::time::sleep(settings.loot_confirm_delay()).await;

        let confirmed = self
            .ports
            .framework
            .run_check(Box::new(move |world: &dyn GameWorldPort| match container {
                LootContainer::DeepDungeonCoffer => true,
                LootContainer::Treasure => {
                    world.party_size() <= 1 || world.loot_table_contains(object_id)
                }
            }))
            .await;

        match confirmed {
            Ok(true) => {
                *self
                    .last_opened
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(object_id);
                debug!(object_id, "Loot container confirmed");
                self.apply_cursed_loot().await;
            }
            Ok(false) => debug!(object_id, "Container not in loot table"),
            Err(e) => warn!(error = %e, "Loot confirmation failed"),
        }
    }

    async fn apply_cursed_loot(&self) -> Option<CursedItem> {
        let settings = self.ports.settings.get().await;
        let roll = self.ports.random.gen_range(0, 99);
        if roll >= i64::from(settings.lock_chance) {
            debug!(roll, chance = settings.lock_chance, "Cursed loot roll missed");
            return None;
        }

        let snapshot = self.ports.state.snapshot();
        if snapshot.first_free_gag_slot().is_some() {
            let candidates = self.lock_pool().gag_candidates(&snapshot);
            if let Some(item) = self.pick(candidates) {
                if self.apply_item(&item, &settings).await {
                    return Some(item);
                }
            }
        }

        if snapshot.first_free_restriction_slot().is_some() {
            let candidates = self.lock_pool().restriction_candidates(&snapshot);
            if let Some(item) = self.pick(candidates) {
                if self.apply_item(&item, &settings).await {
                    return Some(item);
                }
            }
        }

        debug!("No cursed item could be applied");
        None
    }

    fn pick(&self, mut candidates: Vec<CursedItem>) -> Option<CursedItem> {
        if candidates.is_empty() {
            return None;
        }
        let last = candidates.len() as i64 - 1;
        let index = self.ports.random.gen_range(0, last).clamp(0, last) as usize;
        Some(candidates.swap_remove(index))
    }

    /// Push, apply locally, then activate; any failure leaves the pool as it was
    async fn apply_item(&self, item: &CursedItem, settings: &AutomationSettings) -> bool {
        let now = self.ports.clock.now();
        let (min, max) = settings.lock_duration_range();
        let as_secs = |d: std::time::Duration| i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
        let secs = self.ports.random.gen_range(as_secs(min), as_secs(max));
        let Some(release_time) =
            TimeDelta::try_seconds(secs).and_then(|lock_for| now.checked_add_signed(lock_for))
        else {
            warn!(secs, item = %item.label, "Lock duration out of range");
            return false;
        };
        let lock = TimerLock { release_time };

        // Re-read slots; the state may have moved while candidates were chosen
        let snapshot = self.ports.state.snapshot();
        let (update, slot) = match &item.restriction {
            CursedRestriction::Gag(gag) => {
                let Some(slot) = snapshot.first_free_gag_slot() else {
                    return false;
                };
                let update = StateUpdate::Gag {
                    slot,
                    gag: Some(gag.clone()),
                    lock: Some(lock.clone()),
                };
                (update, slot)
            }
            CursedRestriction::Restriction(id) => {
                let Some(slot) = snapshot.first_free_restriction_slot() else {
                    return false;
                };
                let update = StateUpdate::Restriction {
                    slot,
                    restriction_id: Some(*id),
                    lock: Some(lock.clone()),
                };
                (update, slot)
            }
        };

        if let Err(e) = self.ports.remote.push_update(update).await {
            warn!(error = %e, item = %item.label, "Cursed item push failed");
            return false;
        }

        let applied = match &item.restriction {
            CursedRestriction::Gag(gag) => {
                self.ports
                    .state
                    .apply_gag(slot, gag.clone(), &self.client_uid, Some(lock))
            }
            CursedRestriction::Restriction(id) => {
                self.ports
                    .state
                    .apply_restriction(slot, *id, &self.client_uid, Some(lock))
            }
        };
        if let Err(e) = applied {
            warn!(error = %e, item = %item.label, slot, "Cursed item apply failed after push");
            self.restore_remote_slot(&item.restriction, slot).await;
            return false;
        }

        self.lock_pool().activate(item.id, now, release_time);
        info!(item = %item.label, slot, %release_time, "Cursed item applied");
        true
    }

    /// Push the local content of `slot` so the remote drops an item that
    /// was pushed but never applied locally
    async fn restore_remote_slot(&self, restriction: &CursedRestriction, slot: usize) {
        let snapshot = self.ports.state.snapshot();
        let update = match restriction {
            CursedRestriction::Gag(_) => {
                let current = snapshot.gags.get(slot).cloned().flatten();
                StateUpdate::Gag {
                    slot,
                    gag: current.as_ref().map(|s| s.gag.clone()),
                    lock: current.and_then(|s| s.lock),
                }
            }
            CursedRestriction::Restriction(_) => {
                let current = snapshot.restrictions.get(slot).cloned().flatten();
                StateUpdate::Restriction {
                    slot,
                    restriction_id: current.as_ref().map(|s| s.restriction_id),
                    lock: current.and_then(|s| s.lock),
                }
            }
        };
        if let Err(e) = self.ports.remote.push_update(update).await {
            warn!(error = %e, slot, "Could not restore remote slot");
        }
    }

    /// Remove `item` remotely then locally; true once it is no longer worn
    async fn take_off(&self, item: &CursedItem) -> bool {
        let snapshot = self.ports.state.snapshot();
        let removal = match &item.restriction {
            CursedRestriction::Gag(gag) => snapshot
                .gags
                .iter()
                .rposition(|s| s.as_ref().is_some_and(|s| &s.gag == gag))
                .map(|slot| {
                    (
                        StateUpdate::Gag {
                            slot,
                            gag: None,
                            lock: None,
                        },
                        slot,
                    )
                }),
            CursedRestriction::Restriction(id) => {
                snapshot.restriction_slot_of(*id).map(|slot| {
                    (
                        StateUpdate::Restriction {
                            slot,
                            restriction_id: None,
                            lock: None,
                        },
                        slot,
                    )
                })
            }
        };
        let Some((update, slot)) = removal else {
            debug!(item = %item.label, "Expired item no longer worn");
            return true;
        };

        if !self.ports.remote.is_connected() {
            debug!(item = %item.label, "Remote session offline, deferring release");
            return false;
        }
        if let Err(e) = self.ports.remote.push_update(update).await {
            warn!(error = %e, item = %item.label, "Release push failed");
            return false;
        }
        let removed = match &item.restriction {
            CursedRestriction::Gag(_) => self
                .ports
                .state
                .remove_gag(slot, &self.client_uid)
                .map(|_| ()),
            CursedRestriction::Restriction(_) => self
                .ports
                .state
                .remove_restriction(slot, &self.client_uid)
                .map(|_| ()),
        };
        match removed {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, item = %item.label, "Could not take off expired item");
                false
            }
        }
    }
}
