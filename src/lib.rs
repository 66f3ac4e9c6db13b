//! Restraint Automation - Event-driven automation of a player's restriction profile
//!
//! The engine:
//! - Matches observed game and session events against configured triggers
//! - Executes trigger actions under permission and state checks
//! - Reconstructs turn-based dice games from chat
//! - Attaches timed cursed items to opened loot containers

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod e2e_tests;
