//! Application configuration

use std::env;

use anyhow::{Context, Result};

use crate::domain::value_objects::{PlayerName, UserUid};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Network identity of the local player
    pub client_uid: UserUid,
    /// In-game name of the local player (`Name@World`)
    pub client_name: PlayerName,

    /// Seed trigger list as a JSON array
    pub triggers_json: Option<String>,
    /// Let the local player's own triggers relay any chat command
    pub relay_own_triggers: bool,

    /// Simulated party size, 1 when solo
    pub party_size: usize,
    /// Whether the simulated remote session starts connected
    pub remote_connected: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_uid: UserUid::new(
                env::var("AUTOMATION_CLIENT_UID").unwrap_or_else(|_| "local".to_string()),
            ),
            client_name: PlayerName::new(
                env::var("AUTOMATION_CLIENT_NAME")
                    .unwrap_or_else(|_| "Local Player@Home".to_string()),
            ),

            triggers_json: env::var("AUTOMATION_TRIGGERS_JSON").ok(),
            relay_own_triggers: env::var("AUTOMATION_RELAY_OWN_TRIGGERS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("AUTOMATION_RELAY_OWN_TRIGGERS must be true or false")?,

            party_size: env::var("AUTOMATION_SIM_PARTY_SIZE")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("AUTOMATION_SIM_PARTY_SIZE must be a positive number")?,
            remote_connected: env::var("AUTOMATION_SIM_REMOTE_CONNECTED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("AUTOMATION_SIM_REMOTE_CONNECTED must be true or false")?,
        })
    }

    /// Defaults for a solo local session
    pub fn local(client_uid: &str, client_name: &str) -> Self {
        Self {
            client_uid: UserUid::new(client_uid),
            client_name: PlayerName::new(client_name),
            triggers_json: None,
            relay_own_triggers: true,
            party_size: 1,
            remote_connected: true,
        }
    }
}
