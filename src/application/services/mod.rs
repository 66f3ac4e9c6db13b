//! Application services - Use case implementations
//!
//! Each service accepts its ports through the constructor and never reaches
//! for ambient state. Trackers turn raw inputs into events, the trigger
//! registry matches them and the action executor performs the reactions.

pub mod action_executor_service;
pub mod cursed_loot_service;
pub mod device_bridge_service;
pub mod settings_service;
pub mod trigger_dispatch_service;
pub mod trigger_service;
pub mod turn_game_service;

pub use action_executor_service::{ActionExecutorService, ExecutorPorts};
pub use cursed_loot_service::{CursedLootPorts, CursedLootService};
pub use device_bridge_service::DeviceBridgeService;
pub use settings_service::SettingsService;
pub use trigger_dispatch_service::TriggerDispatchService;
pub use trigger_service::{TriggerService, TriggerServiceImpl};
pub use turn_game_service::{TurnGameCompletion, TurnGameTracker};
