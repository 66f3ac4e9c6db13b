//! Infrastructure layer - Adapters and engine wiring
//!
//! This layer contains:
//! - Restriction store: in-memory state that publishes change events
//! - Channels: the event bus and the outbound chat-command feed
//! - Framework: the update loop and the interaction hook boundary
//! - Collaborators: local stand-ins for network and device services
//! - Persistence: JSON-document trigger and settings stores
//! - Config and State: environment configuration and engine start/stop

pub mod channels;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod framework;
pub mod interaction_hook;
pub mod permissions;
pub mod persistence;
pub mod restriction_store;
pub mod state;
