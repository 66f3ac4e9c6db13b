//! Remote session port - Keeps other observers in sync with local state changes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{GagType, RestraintId, RestrictionId, TimerLock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Not connected to the remote session")]
    NotConnected,
    #[error("Push rejected: {0}")]
    Rejected(String),
    #[error("Push timed out")]
    Timeout,
}

/// A state change pushed to other observers; `None` means removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateUpdate {
    Gag {
        slot: usize,
        gag: Option<GagType>,
        lock: Option<TimerLock>,
    },
    Restraint {
        restraint_id: Option<RestraintId>,
    },
    Restriction {
        slot: usize,
        restriction_id: Option<RestrictionId>,
        lock: Option<TimerLock>,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSessionPort: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Resolves once the remote side acknowledged the update
    async fn push_update(&self, update: StateUpdate) -> Result<(), RemoteError>;
}
