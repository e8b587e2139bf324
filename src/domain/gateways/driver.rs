//! Driver Gateways
//!
//! Abstract contracts for the database driver, the loader that builds it from
//! credential material, and the connection pool it opens.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::domain::models::connection::ConnectionString;
use crate::shared::errors::{DriverError, PoolError};

/// A registered database driver
#[cfg_attr(test, mockall::automock)]
pub trait Driver: Send + Sync {
    /// Prepare a pool for `dsn`; no connection is made until the pool is pinged
    fn open(&self, dsn: &ConnectionString) -> Result<Box<dyn SqlPool>, DriverError>;
}

/// Builds a driver from a credential file
#[cfg_attr(test, mockall::automock)]
pub trait DriverLoader: Send + Sync {
    fn load(&self, credentials_path: &Path) -> Result<Arc<dyn Driver>, DriverError>;
}

/// A connection pool under construction
///
/// Setters mirror the four pool-tuning settings. A value of 0 means unlimited
/// for every setter except `set_max_idle_conns`.
#[async_trait]
pub trait SqlPool: Send {
    fn set_max_open_conns(&mut self, max: u32) -> Result<(), PoolError>;

    fn set_max_idle_conns(&mut self, max: u32) -> Result<(), PoolError>;

    fn set_conn_max_lifetime(&mut self, lifetime: Duration) -> Result<(), PoolError>;

    fn set_conn_max_idle_time(&mut self, idle: Duration) -> Result<(), PoolError>;

    /// Verify connectivity, opening the pool if needed
    async fn ping(&mut self) -> Result<(), PoolError>;

    /// Hand the verified pool over to the ORM
    fn into_orm(&mut self) -> Result<DatabaseConnection, PoolError>;
}
