//! In-memory restriction state store
//!
//! Holds the live slot arrays behind one mutex and publishes a state-change
//! event after every successful mutation. Events are published after the lock
//! is released.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::application::ports::outbound::{EventBusPort, RestrictionStatePort, StateError};
use crate::domain::events::AutomationEvent;
use crate::domain::value_objects::{
    ActiveRestraint, GagSlot, GagType, ItemRef, NewState, RestraintId, RestrictionId,
    RestrictionSlot, RestrictionSnapshot, TimerLock, UserUid,
};

#[derive(Default)]
struct Capabilities {
    /// Items that conflict with what is worn and cannot be enabled
    conflicts: HashSet<ItemRef>,
    /// Items under a hardcore lock that cannot be disabled
    hardcore: HashSet<ItemRef>,
}

pub struct InMemoryRestrictionStore {
    state: Mutex<RestrictionSnapshot>,
    capabilities: Mutex<Capabilities>,
    events: Arc<dyn EventBusPort>,
}

impl InMemoryRestrictionStore {
    pub fn new(events: Arc<dyn EventBusPort>) -> Self {
        Self {
            state: Mutex::new(RestrictionSnapshot::default()),
            capabilities: Mutex::new(Capabilities::default()),
            events,
        }
    }

    pub fn set_conflict(&self, item: ItemRef, conflicting: bool) {
        let mut caps = self.lock_capabilities();
        if conflicting {
            caps.conflicts.insert(item);
        } else {
            caps.conflicts.remove(&item);
        }
    }

    pub fn set_hardcore_lock(&self, item: ItemRef, locked: bool) {
        let mut caps = self.lock_capabilities();
        if locked {
            caps.hardcore.insert(item);
        } else {
            caps.hardcore.remove(&item);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RestrictionSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_capabilities(&self) -> MutexGuard<'_, Capabilities> {
        self.capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: AutomationEvent) {
        debug!(kind = ?event.kind(), "Restriction state changed");
        self.events.publish(event);
    }
}

impl RestrictionStatePort for InMemoryRestrictionStore {
    fn snapshot(&self) -> RestrictionSnapshot {
        self.lock_state().clone()
    }

    fn apply_gag(
        &self,
        slot: usize,
        gag: GagType,
        enactor: &UserUid,
        lock: Option<TimerLock>,
    ) -> Result<(), StateError> {
        {
            let mut state = self.lock_state();
            let entry = state
                .gags
                .get_mut(slot)
                .ok_or(StateError::InvalidSlot(slot))?;
            if entry.is_some() {
                return Err(StateError::SlotOccupied(slot));
            }
            *entry = Some(GagSlot {
                gag: gag.clone(),
                enactor: enactor.clone(),
                lock,
            });
        }
        self.publish(AutomationEvent::GagStateChanged {
            gag,
            slot,
            new_state: NewState::Enabled,
            enactor: enactor.clone(),
        });
        Ok(())
    }

    fn remove_gag(&self, slot: usize, enactor: &UserUid) -> Result<GagType, StateError> {
        let removed = {
            let mut state = self.lock_state();
            let entry = state
                .gags
                .get_mut(slot)
                .ok_or(StateError::InvalidSlot(slot))?;
            entry.take().ok_or(StateError::SlotEmpty(slot))?
        };
        self.publish(AutomationEvent::GagStateChanged {
            gag: removed.gag.clone(),
            slot,
            new_state: NewState::Disabled,
            enactor: enactor.clone(),
        });
        Ok(removed.gag)
    }

    fn apply_restraint(&self, restraint_id: RestraintId, enactor: &UserUid) -> Result<(), StateError> {
        {
            let mut state = self.lock_state();
            if state.restraint.is_some() {
                return Err(StateError::RestraintAlreadyActive);
            }
            state.restraint = Some(ActiveRestraint {
                restraint_id,
                enactor: enactor.clone(),
            });
        }
        self.publish(AutomationEvent::RestraintStateChanged {
            restraint_id,
            new_state: NewState::Enabled,
            enactor: enactor.clone(),
        });
        Ok(())
    }

    fn swap_restraint(&self, restraint_id: RestraintId, enactor: &UserUid) -> Result<(), StateError> {
        let previous = {
            let mut state = self.lock_state();
            let previous = state
                .restraint
                .take()
                .ok_or(StateError::NoActiveRestraint)?;
            state.restraint = Some(ActiveRestraint {
                restraint_id,
                enactor: enactor.clone(),
            });
            previous
        };
        self.publish(AutomationEvent::RestraintStateChanged {
            restraint_id: previous.restraint_id,
            new_state: NewState::Disabled,
            enactor: enactor.clone(),
        });
        self.publish(AutomationEvent::RestraintStateChanged {
            restraint_id,
            new_state: NewState::Enabled,
            enactor: enactor.clone(),
        });
        Ok(())
    }

    fn disable_restraint(&self, restraint_id: RestraintId, enactor: &UserUid) -> Result<(), StateError> {
        {
            let mut state = self.lock_state();
            if !state.is_restraint_active(restraint_id) {
                return Err(StateError::RestraintNotActive(restraint_id));
            }
            state.restraint = None;
        }
        self.publish(AutomationEvent::RestraintStateChanged {
            restraint_id,
            new_state: NewState::Disabled,
            enactor: enactor.clone(),
        });
        Ok(())
    }

    fn apply_restriction(
        &self,
        slot: usize,
        restriction_id: RestrictionId,
        enactor: &UserUid,
        lock: Option<TimerLock>,
    ) -> Result<(), StateError> {
        {
            let mut state = self.lock_state();
            let entry = state
                .restrictions
                .get_mut(slot)
                .ok_or(StateError::InvalidSlot(slot))?;
            if entry.is_some() {
                return Err(StateError::SlotOccupied(slot));
            }
            *entry = Some(RestrictionSlot {
                restriction_id,
                enactor: enactor.clone(),
                lock,
            });
        }
        self.publish(AutomationEvent::RestrictionStateChanged {
            restriction_id,
            slot,
            new_state: NewState::Enabled,
            enactor: enactor.clone(),
        });
        Ok(())
    }

    fn remove_restriction(&self, slot: usize, enactor: &UserUid) -> Result<RestrictionId, StateError> {
        let removed = {
            let mut state = self.lock_state();
            let entry = state
                .restrictions
                .get_mut(slot)
                .ok_or(StateError::InvalidSlot(slot))?;
            entry.take().ok_or(StateError::SlotEmpty(slot))?
        };
        self.publish(AutomationEvent::RestrictionStateChanged {
            restriction_id: removed.restriction_id,
            slot,
            new_state: NewState::Disabled,
            enactor: enactor.clone(),
        });
        Ok(removed.restriction_id)
    }

    fn can_enable(&self, item: ItemRef) -> bool {
        !self.lock_capabilities().conflicts.contains(&item)
    }

    fn can_disable(&self, item: ItemRef) -> bool {
        !self.lock_capabilities().hardcore.contains(&item)
    }
}
