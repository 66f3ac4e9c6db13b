//! Domain layer - Core automation logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Trigger, InvokableAction, TurnGameSession, LootPool
//! - Value Objects: identities, restriction vocabulary, device payloads, settings
//! - Events: the observations triggers react to

pub mod entities;
pub mod events;
pub mod value_objects;
