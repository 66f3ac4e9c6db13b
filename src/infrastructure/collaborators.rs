//! Local stand-ins for network and device collaborators
//!
//! The remote session, mood-effect plugin, shock-collar service and toy server
//! live outside this crate. These adapters keep their contracts so the engine
//! runs on its own; each one records what it was asked to do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::ports::outbound::{
    DeviceBattery, DeviceClientPort, DeviceError, MoodleError, MoodlePort, RemoteError,
    RemoteSessionPort, ShockCollarPort, StateUpdate,
};
use crate::domain::value_objects::{
    MoodlePresetId, MoodleStatusId, ShockCredential, ShockInstruction, ToyInstruction,
};

/// Remote session that acknowledges every push while connected
pub struct LoopbackRemoteSession {
    connected: AtomicBool,
    pushed: Mutex<Vec<StateUpdate>>,
}

impl LoopbackRemoteSession {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
            pushed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn pushed(&self) -> Vec<StateUpdate> {
        self.pushed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RemoteSessionPort for LoopbackRemoteSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn push_update(&self, update: StateUpdate) -> Result<(), RemoteError> {
        if !self.is_connected() {
            return Err(RemoteError::NotConnected);
        }
        debug!(?update, "Pushed state update");
        self.pushed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update);
        Ok(())
    }
}

/// Mood-effect catalog kept in memory
pub struct LocalMoodleCatalog {
    available: AtomicBool,
    statuses: Vec<MoodleStatusId>,
    presets: Vec<MoodlePresetId>,
    active: Mutex<Vec<MoodleStatusId>>,
}

impl LocalMoodleCatalog {
    pub fn new(statuses: Vec<MoodleStatusId>, presets: Vec<MoodlePresetId>) -> Self {
        Self {
            available: AtomicBool::new(true),
            statuses,
            presets,
            active: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn active(&self) -> std::sync::MutexGuard<'_, Vec<MoodleStatusId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MoodlePort for LocalMoodleCatalog {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn status_ids(&self) -> Result<Vec<MoodleStatusId>, MoodleError> {
        Ok(self.statuses.clone())
    }

    async fn preset_ids(&self) -> Result<Vec<MoodlePresetId>, MoodleError> {
        Ok(self.presets.clone())
    }

    async fn active_status_ids(&self) -> Result<Vec<MoodleStatusId>, MoodleError> {
        Ok(self.active().clone())
    }

    async fn apply_status(&self, id: MoodleStatusId) -> Result<(), MoodleError> {
        if !self.is_available() {
            return Err(MoodleError::Unavailable);
        }
        self.active().push(id);
        Ok(())
    }

    async fn apply_preset(&self, id: MoodlePresetId) -> Result<(), MoodleError> {
        if !self.is_available() {
            return Err(MoodleError::Unavailable);
        }
        info!(preset_id = %id, "Applied mood-effect preset");
        Ok(())
    }
}

/// Shock-collar service that only logs instructions
#[derive(Default)]
pub struct LoggingShockCollar;

#[async_trait]
impl ShockCollarPort for LoggingShockCollar {
    async fn send(
        &self,
        credential: &ShockCredential,
        instruction: &ShockInstruction,
    ) -> Result<(), DeviceError> {
        info!(
            share_code = %credential.share_code,
            op = ?instruction.op_code,
            intensity = instruction.intensity,
            duration_ms = instruction.duration_ms,
            "Shock-collar instruction"
        );
        Ok(())
    }
}

/// Toy server with a fixed set of simulated devices
pub struct SimulatedDeviceClient {
    connected: AtomicBool,
    devices: Vec<DeviceBattery>,
}

impl SimulatedDeviceClient {
    pub fn new(devices: Vec<DeviceBattery>) -> Self {
        Self {
            connected: AtomicBool::new(false),
            devices,
        }
    }
}

#[async_trait]
impl DeviceClientPort for SimulatedDeviceClient {
    async fn connect(&self) -> Result<(), DeviceError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn battery_levels(&self) -> Result<Vec<DeviceBattery>, DeviceError> {
        if !self.is_connected() {
            return Err(DeviceError::NotConnected);
        }
        Ok(self.devices.clone())
    }

    async fn send_instruction(&self, instruction: &ToyInstruction) -> Result<(), DeviceError> {
        if !self.is_connected() {
            return Err(DeviceError::NotConnected);
        }
        info!(
            motor = ?instruction.motor,
            intensity = instruction.intensity,
            duration_ms = instruction.duration_ms,
            devices = self.devices.len(),
            "Toy instruction"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_rejects_when_disconnected() {
        let remote = LoopbackRemoteSession::new(false);
        let update = StateUpdate::Restraint { restraint_id: None };
        assert_eq!(
            remote.push_update(update.clone()).await,
            Err(RemoteError::NotConnected)
        );

        remote.set_connected(true);
        remote.push_update(update.clone()).await.unwrap();
        assert_eq!(remote.pushed(), vec![update]);
    }

    #[tokio::test]
    async fn test_moodle_catalog_tracks_active_statuses() {
        let status = MoodleStatusId::new();
        let catalog = LocalMoodleCatalog::new(vec![status], Vec::new());
        catalog.apply_status(status).await.unwrap();
        assert_eq!(catalog.active_status_ids().await.unwrap(), vec![status]);

        catalog.set_available(false);
        assert_eq!(
            catalog.apply_status(status).await,
            Err(MoodleError::Unavailable)
        );
    }
}
