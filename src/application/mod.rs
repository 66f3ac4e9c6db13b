//! Application layer - Use cases orchestrating the domain through ports
//!
//! - Ports: inbound event sources and outbound collaborator contracts
//! - Services: trigger registry, action executor, session trackers, devices

pub mod ports;
pub mod services;
