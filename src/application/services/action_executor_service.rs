//! Action Executor Service - Turns an invokable action into a state change
//!
//! Every action variant has one handler. Handlers never return errors: a refused
//! guard, a state conflict or a failing collaborator all end in `false`, with a
//! log line naming the reason. Remote pushes happen before the local mutation
//! so a failed push leaves local state untouched.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{
    ChatCommandPort, MoodlePort, PermissionPort, RemoteSessionPort, RestrictionStatePort,
    ShockCollarPort, StateUpdate,
};
use crate::application::services::{DeviceBridgeService, SettingsService};
use crate::domain::entities::InvokableAction;
use crate::domain::value_objects::{
    GagRef, ItemRef, MoodleRef, NewState, RestraintId, RestrictionId, ShockInstruction,
    ToyInstruction, UserUid, RESTRICTION_SLOT_COUNT,
};

/// Collaborators the executor acts through
#[derive(Clone)]
pub struct ExecutorPorts {
    pub permissions: Arc<dyn PermissionPort>,
    pub state: Arc<dyn RestrictionStatePort>,
    pub remote: Arc<dyn RemoteSessionPort>,
    pub moodles: Arc<dyn MoodlePort>,
    pub shock_collar: Arc<dyn ShockCollarPort>,
    pub devices: Arc<DeviceBridgeService>,
    pub chat: Arc<dyn ChatCommandPort>,
    pub settings: Arc<SettingsService>,
}

pub struct ActionExecutorService {
    client_uid: UserUid,
    ports: ExecutorPorts,
}

impl ActionExecutorService {
    pub fn new(client_uid: UserUid, ports: ExecutorPorts) -> Self {
        Self { client_uid, ports }
    }

    pub fn client_uid(&self) -> &UserUid {
        &self.client_uid
    }

    /// Perform `action` on behalf of `performer`
    #[instrument(skip(self, action), fields(action = action.name(), performer = %performer))]
    pub async fn execute_action(&self, action: &InvokableAction, performer: &UserUid) -> bool {
        let success = match action {
            InvokableAction::TextOutput { command } => self.text_output(command, performer),
            InvokableAction::Gag { gag, new_state } => match new_state {
                NewState::Enabled => self.enable_gag(gag, performer).await,
                NewState::Disabled => self.disable_gag(gag, performer).await,
            },
            InvokableAction::Restraint {
                restraint_id,
                new_state,
            } => match new_state {
                NewState::Enabled => self.enable_restraint(*restraint_id, performer).await,
                NewState::Disabled => self.disable_restraint(*restraint_id, performer).await,
            },
            InvokableAction::Restriction {
                restriction_id,
                new_state,
            } => match new_state {
                NewState::Enabled => self.enable_restriction(*restriction_id, performer).await,
                NewState::Disabled => self.disable_restriction(*restriction_id, performer).await,
            },
            InvokableAction::Moodle { moodle } => self.apply_moodle(*moodle).await,
            InvokableAction::ShockCollar { instruction } => self.shock(instruction).await,
            InvokableAction::SexToy { instruction } => self.toy(instruction),
        };
        debug!(success, "Action executed");
        success
    }

    /// Run `actions` in order; `on_any_success` fires once if at least one succeeded
    pub async fn execute_multiple<F>(
        &self,
        actions: &[InvokableAction],
        performer: &UserUid,
        on_any_success: F,
    ) -> bool
    where
        F: FnOnce() + Send,
    {
        let mut any_success = false;
        for action in actions {
            any_success |= self.execute_action(action, performer).await;
        }
        if any_success {
            on_any_success();
        }
        any_success
    }

    fn text_output(&self, command: &str, performer: &UserUid) -> bool {
        let Some(command) = compose_command(command) else {
            debug!("Composed command is empty");
            return false;
        };

        let permissions = &self.ports.permissions;
        let allowed = permissions.can_relay_all(performer, &self.client_uid)
            || permissions.can_relay_free_text(performer, &self.client_uid)
            || (is_emote_command(&command)
                && permissions.can_relay_emote(performer, &self.client_uid));
        if !allowed {
            debug!("Relay not permitted");
            return false;
        }

        match self.ports.chat.enqueue_command(command) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not enqueue chat command");
                false
            }
        }
    }

    async fn enable_gag(&self, gag: &GagRef, performer: &UserUid) -> bool {
        let GagRef::Gag(gag) = gag else {
            debug!("Cannot apply the wildcard gag");
            return false;
        };
        let snapshot = self.ports.state.snapshot();
        if snapshot.is_gag_worn(gag) {
            debug!(gag = %gag, "Gag already worn");
            return false;
        }
        let Some(slot) = snapshot.first_free_gag_slot() else {
            debug!("All gag slots are occupied");
            return false;
        };

        let update = StateUpdate::Gag {
            slot,
            gag: Some(gag.clone()),
            lock: None,
        };
        if !self.push_remote(update).await {
            return false;
        }
        match self.ports.state.apply_gag(slot, gag.clone(), performer, None) {
            Ok(()) => {
                info!(gag = %gag, slot, "Gag applied");
                true
            }
            Err(e) => {
                warn!(error = %e, "Gag apply failed");
                false
            }
        }
    }

    async fn disable_gag(&self, gag: &GagRef, performer: &UserUid) -> bool {
        let snapshot = self.ports.state.snapshot();
        let Some(slot) = snapshot.outermost_gag_slot(gag) else {
            debug!("No matching gag worn");
            return false;
        };
        if snapshot.gags[slot].as_ref().is_some_and(|s| s.lock.is_some()) {
            debug!(slot, "Gag slot is locked");
            return false;
        }

        let update = StateUpdate::Gag {
            slot,
            gag: None,
            lock: None,
        };
        if !self.push_remote(update).await {
            return false;
        }
        match self.ports.state.remove_gag(slot, performer) {
            Ok(removed) => {
                info!(gag = %removed, slot, "Gag removed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Gag removal failed");
                false
            }
        }
    }

    async fn enable_restraint(&self, restraint_id: RestraintId, performer: &UserUid) -> bool {
        let snapshot = self.ports.state.snapshot();
        if snapshot.is_restraint_active(restraint_id) {
            debug!(%restraint_id, "Restraint already active");
            return false;
        }
        if !self.ports.state.can_enable(ItemRef::Restraint(restraint_id)) {
            debug!(%restraint_id, "Enabling restraint not permitted");
            return false;
        }

        let update = StateUpdate::Restraint {
            restraint_id: Some(restraint_id),
        };
        if !self.push_remote(update).await {
            return false;
        }
        let result = if snapshot.restraint.is_some() {
            self.ports.state.swap_restraint(restraint_id, performer)
        } else {
            self.ports.state.apply_restraint(restraint_id, performer)
        };
        match result {
            Ok(()) => {
                info!(%restraint_id, "Restraint enabled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Restraint enable failed");
                false
            }
        }
    }

    async fn disable_restraint(&self, restraint_id: RestraintId, performer: &UserUid) -> bool {
        if !self.ports.state.snapshot().is_restraint_active(restraint_id) {
            debug!(%restraint_id, "Restraint not active");
            return false;
        }
        if !self.ports.state.can_disable(ItemRef::Restraint(restraint_id)) {
            debug!(%restraint_id, "Disabling restraint not permitted");
            return false;
        }

        if !self
            .push_remote(StateUpdate::Restraint { restraint_id: None })
            .await
        {
            return false;
        }
        match self.ports.state.disable_restraint(restraint_id, performer) {
            Ok(()) => {
                info!(%restraint_id, "Restraint disabled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Restraint disable failed");
                false
            }
        }
    }

    async fn enable_restriction(&self, restriction_id: RestrictionId, performer: &UserUid) -> bool {
        let snapshot = self.ports.state.snapshot();
        if snapshot.restriction_slot_of(restriction_id).is_some() {
            debug!(%restriction_id, "Restriction already applied");
            return false;
        }

        // With every layer occupied the outermost one is swapped out
        let (slot, swapping) = match snapshot.first_free_restriction_slot() {
            Some(slot) => (slot, false),
            None => (RESTRICTION_SLOT_COUNT - 1, true),
        };
        if swapping
            && snapshot.restrictions[slot]
                .as_ref()
                .is_some_and(|s| s.lock.is_some())
        {
            debug!(slot, "Outermost restriction is locked");
            return false;
        }
        if !self.ports.state.can_enable(ItemRef::Restriction(restriction_id)) {
            debug!(%restriction_id, "Enabling restriction not permitted");
            return false;
        }

        let update = StateUpdate::Restriction {
            slot,
            restriction_id: Some(restriction_id),
            lock: None,
        };
        if !self.push_remote(update).await {
            return false;
        }
        if swapping {
            if let Err(e) = self.ports.state.remove_restriction(slot, performer) {
                warn!(error = %e, "Could not clear outermost restriction");
                return false;
            }
        }
        match self
            .ports
            .state
            .apply_restriction(slot, restriction_id, performer, None)
        {
            Ok(()) => {
                info!(%restriction_id, slot, swapping, "Restriction enabled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Restriction enable failed");
                false
            }
        }
    }

    async fn disable_restriction(&self, restriction_id: RestrictionId, performer: &UserUid) -> bool {
        let snapshot = self.ports.state.snapshot();
        let Some(slot) = snapshot.restriction_slot_of(restriction_id) else {
            debug!(%restriction_id, "Restriction not applied");
            return false;
        };
        if snapshot.restrictions[slot]
            .as_ref()
            .is_some_and(|s| s.lock.is_some())
        {
            debug!(slot, "Restriction is locked");
            return false;
        }
        if !self
            .ports
            .state
            .can_disable(ItemRef::Restriction(restriction_id))
        {
            debug!(%restriction_id, "Disabling restriction not permitted");
            return false;
        }

        let update = StateUpdate::Restriction {
            slot,
            restriction_id: None,
            lock: None,
        };
        if !self.push_remote(update).await {
            return false;
        }
        match self.ports.state.remove_restriction(slot, performer) {
            Ok(_) => {
                info!(%restriction_id, slot, "Restriction disabled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Restriction disable failed");
                false
            }
        }
    }

    async fn apply_moodle(&self, moodle: MoodleRef) -> bool {
        let moodles = &self.ports.moodles;
        if !moodles.is_available() {
            debug!("Mood-effect collaborator unavailable");
            return false;
        }

        let result = match moodle {
            MoodleRef::Status(id) => {
                match moodles.status_ids().await {
                    Ok(known) if known.contains(&id) => {}
                    Ok(_) => {
                        debug!(status_id = %id, "Unknown status");
                        return false;
                    }
                    Err(e) => {
                        warn!(error = %e, "Could not read status catalog");
                        return false;
                    }
                }
                match moodles.active_status_ids().await {
                    Ok(active) if active.contains(&id) => {
                        debug!(status_id = %id, "Status already active");
                        return false;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Could not read active statuses");
                        return false;
                    }
                }
                moodles.apply_status(id).await
            }
            MoodleRef::Preset(id) => {
                match moodles.preset_ids().await {
                    Ok(known) if known.contains(&id) => {}
                    Ok(_) => {
                        debug!(preset_id = %id, "Unknown preset");
                        return false;
                    }
                    Err(e) => {
                        warn!(error = %e, "Could not read preset catalog");
                        return false;
                    }
                }
                moodles.apply_preset(id).await
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Mood-effect apply failed");
                false
            }
        }
    }

    async fn shock(&self, instruction: &ShockInstruction) -> bool {
        let Some(credential) = self
            .ports
            .settings
            .get()
            .await
            .shock_credential
            .filter(|c| c.is_valid())
        else {
            debug!("No valid shock-collar credential configured");
            return false;
        };

        let collar = self.ports.shock_collar.clone();
        let instruction = instruction.clone();
        tokio::spawn(async move {
            if let Err(e) = collar.send(&credential, &instruction).await {
                warn!(error = %e, "Shock-collar instruction failed");
            }
        });
        true
    }

    fn toy(&self, instruction: &ToyInstruction) -> bool {
        self.ports.devices.enqueue(instruction.clone())
    }

    /// Push to the remote session; local-only when not connected
    async fn push_remote(&self, update: StateUpdate) -> bool {
        if !self.ports.remote.is_connected() {
            debug!("Remote session offline, applying locally only");
            return true;
        }
        match self.ports.remote.push_update(update).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Remote push failed");
                false
            }
        }
    }
}

/// Normalize a configured command to `/<body>`; `None` when nothing is left
fn compose_command(raw: &str) -> Option<String> {
    let body = raw.trim();
    let body = body.strip_prefix('/').unwrap_or(body).trim();
    if body.is_empty() {
        None
    } else {
        Some(format!("/{body}"))
    }
}

fn is_emote_command(command: &str) -> bool {
    let lower = command.to_lowercase();
    lower.starts_with("/em ") || lower.starts_with("/emote ")
}
