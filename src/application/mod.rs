//! Application Layer
//!
//! Contains the connection factory use case and the driver registry it
//! registers into.
//! Use cases depend on domain gateways (abstractions), not concrete implementations.

pub mod driver_registry;
pub mod use_cases;

pub use driver_registry::DriverRegistry;
