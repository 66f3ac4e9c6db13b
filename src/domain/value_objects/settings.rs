//! Automation settings value object
//!
//! Settings are serialized so the configuration tooling can store them and
//! hand them back on every save; the engine reads them on each use.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ShockCredential;

/// Upper bound on a cursed-item lock, one year
pub const MAX_LOCK_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// All configurable automation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomationSettings {
    // Cursed loot
    pub cursed_loot_enabled: bool,
    /// Percent chance (0-100) that a confirmed interaction applies an item
    pub lock_chance: u8,
    pub lock_duration_min_secs: u64,
    pub lock_duration_max_secs: u64,
    pub loot_confirm_delay_ms: u64,

    // Devices
    pub battery_poll_interval_secs: u64,
    pub shock_credential: Option<ShockCredential>,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            cursed_loot_enabled: false,
            lock_chance: 10,
            lock_duration_min_secs: 15 * 60,
            lock_duration_max_secs: 60 * 60,
            loot_confirm_delay_ms: 1000,
            battery_poll_interval_secs: 60,
            shock_credential: None,
        }
    }
}

impl AutomationSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let shock_credential = match (
            std::env::var("AUTOMATION_SHOCK_API_KEY"),
            std::env::var("AUTOMATION_SHOCK_SHARE_CODE"),
        ) {
            (Ok(api_key), Ok(share_code)) => Some(ShockCredential { api_key, share_code }),
            _ => defaults.shock_credential.clone(),
        };

        Self {
            cursed_loot_enabled: env_or("AUTOMATION_CURSED_LOOT_ENABLED", defaults.cursed_loot_enabled),
            lock_chance: env_or("AUTOMATION_LOCK_CHANCE", defaults.lock_chance).min(100),
            lock_duration_min_secs: env_or("AUTOMATION_LOCK_MIN_SECS", defaults.lock_duration_min_secs),
            lock_duration_max_secs: env_or("AUTOMATION_LOCK_MAX_SECS", defaults.lock_duration_max_secs),
            loot_confirm_delay_ms: env_or("AUTOMATION_LOOT_CONFIRM_DELAY_MS", defaults.loot_confirm_delay_ms),
            battery_poll_interval_secs: env_or("AUTOMATION_BATTERY_POLL_SECS", defaults.battery_poll_interval_secs),
            shock_credential,
        }
    }

    /// Lock-duration range as (min, max), tolerating an inverted configuration.
    /// Both ends are capped at [`MAX_LOCK_DURATION_SECS`].
    pub fn lock_duration_range(&self) -> (Duration, Duration) {
        let low = self.lock_duration_min_secs.min(MAX_LOCK_DURATION_SECS);
        let high = self.lock_duration_max_secs.min(MAX_LOCK_DURATION_SECS);
        let min = low.min(high);
        let max = low.max(high);
        (Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn loot_confirm_delay(&self) -> Duration {
        Duration::from_millis(self.loot_confirm_delay_ms)
    }

    pub fn battery_poll_interval(&self) -> Duration {
        Duration::from_secs(self.battery_poll_interval_secs.max(1))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_duration_range_is_normalized() {
        let settings = AutomationSettings {
            lock_duration_min_secs: 600,
            lock_duration_max_secs: 60,
            ..Default::default()
        };
        let (min, max) = settings.lock_duration_range();
        assert_eq!(min, Duration::from_secs(60));
        assert_eq!(max, Duration::from_secs(600));
    }

    #[test]
    fn test_oversized_duration_range_is_capped() {
        let settings = AutomationSettings {
            lock_duration_min_secs: 60,
            lock_duration_max_secs: 10_000_000_000_000_000,
            ..Default::default()
        };
        let (min, max) = settings.lock_duration_range();
        assert_eq!(min, Duration::from_secs(60));
        assert_eq!(max, Duration::from_secs(MAX_LOCK_DURATION_SECS));

        let settings = AutomationSettings {
            lock_duration_min_secs: u64::MAX,
            lock_duration_max_secs: u64::MAX,
            ..Default::default()
        };
        let (min, max) = settings.lock_duration_range();
        assert_eq!(min, max);
        assert_eq!(max, Duration::from_secs(MAX_LOCK_DURATION_SECS));
    }
}
