//! Use Cases
//!
//! Application logic orchestrating the driver gateways.

pub mod connect_database;

pub use connect_database::{configure_pool, ConnectDatabaseUseCase, DRIVER_NAME};
