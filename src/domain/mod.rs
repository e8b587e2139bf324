//! Domain Layer
//!
//! Contains the connection settings model, credential and handle types, and
//! the driver gateway traits (ports).
//! This layer has no dependencies on infrastructure.

pub mod gateways;
pub mod models;

pub use gateways::{Driver, DriverLoader, SqlPool};
pub use models::{ConnectionHandle, ConnectionString, Credentials, OverridePolicy, ParseMode, PoolSettings, Settings};
