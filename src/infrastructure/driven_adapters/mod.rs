//! Driven Adapters
//!
//! Implementations of gateway traits for external systems:
//! - Environment configuration
//! - The sqlx-backed AlloyDB driver
//! - Process-wide connection handle management

pub mod alloydb_driver;
pub mod config;
pub mod database;

pub use alloydb_driver::{AlloyDbDriver, AlloyDbDriverLoader};
pub use config::SettingsLoader;
pub use database::{connect, get_db, init_db, DatabaseSlot};
