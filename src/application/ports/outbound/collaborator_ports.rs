//! Collaborator ports - Mood effects, haptic devices and the chat-command channel
//!
//! All collaborators are asynchronous and may fail independently; callers
//! treat failures as ordinary `false` results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    MoodlePresetId, MoodleStatusId, ShockCredential, ShockInstruction, ToyInstruction,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoodleError {
    #[error("Mood-effect collaborator is unavailable")]
    Unavailable,
    #[error("Mood-effect call failed: {0}")]
    CallFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("No device session")]
    NotConnected,
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Device command failed: {0}")]
    CommandFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Chat command channel is closed")]
    ChannelClosed,
}

/// Mood-effect (status icon) collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoodlePort: Send + Sync {
    fn is_available(&self) -> bool;

    /// Every status the catalog knows
    async fn status_ids(&self) -> Result<Vec<MoodleStatusId>, MoodleError>;

    async fn preset_ids(&self) -> Result<Vec<MoodlePresetId>, MoodleError>;

    /// Statuses currently shown on the local player
    async fn active_status_ids(&self) -> Result<Vec<MoodleStatusId>, MoodleError>;

    async fn apply_status(&self, id: MoodleStatusId) -> Result<(), MoodleError>;

    async fn apply_preset(&self, id: MoodlePresetId) -> Result<(), MoodleError>;
}

/// Remote shock-collar service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShockCollarPort: Send + Sync {
    async fn send(
        &self,
        credential: &ShockCredential,
        instruction: &ShockInstruction,
    ) -> Result<(), DeviceError>;
}

/// Battery reading of one connected toy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBattery {
    pub device_name: String,
    /// 0.0-1.0
    pub level: f64,
}

/// Client for the local toy server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceClientPort: Send + Sync {
    async fn connect(&self) -> Result<(), DeviceError>;

    async fn disconnect(&self) -> Result<(), DeviceError>;

    fn is_connected(&self) -> bool;

    async fn battery_levels(&self) -> Result<Vec<DeviceBattery>, DeviceError>;

    async fn send_instruction(&self, instruction: &ToyInstruction) -> Result<(), DeviceError>;
}

/// Outbound chat-command channel of the local player
#[cfg_attr(test, mockall::automock)]
pub trait ChatCommandPort: Send + Sync {
    fn enqueue_command(&self, command: String) -> Result<(), ChatError>;
}
