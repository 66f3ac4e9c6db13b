//! Configuration stores
//!
//! Triggers and settings are kept as serialized JSON documents so the engine
//! sees exactly what configuration tooling would save and load.

mod settings_repository;
mod trigger_repository;

pub use settings_repository::InMemorySettingsRepository;
pub use trigger_repository::InMemoryTriggerRepository;
