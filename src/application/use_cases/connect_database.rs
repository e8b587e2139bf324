//! Connect Database Use Case
//!
//! Registers the driver, opens a pool, applies pool tuning, verifies
//! connectivity and wraps the pool in the ORM.

use std::sync::Arc;

use crate::application::driver_registry::DriverRegistry;
use crate::domain::gateways::{DriverLoader, SqlPool};
use crate::domain::models::connection::{ConnectionHandle, ConnectionString};
use crate::domain::models::settings::{minutes, OverridePolicy, PoolSettings, Settings};
use crate::shared::errors::{ConnectError, PoolError};

/// Name the driver is registered under
pub const DRIVER_NAME: &str = "alloydb";

/// Use case building a verified connection handle from settings
pub struct ConnectDatabaseUseCase {
    registry: Arc<DriverRegistry>,
    loader: Arc<dyn DriverLoader>,
}

impl ConnectDatabaseUseCase {
    /// Create a new ConnectDatabaseUseCase
    #[must_use]
    pub fn new(registry: Arc<DriverRegistry>, loader: Arc<dyn DriverLoader>) -> Self {
        Self { registry, loader }
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns the `ConnectError` variant naming the stage that failed:
    /// driver registration, open, pool configuration, ping or ORM wrap.
    pub async fn execute(&self, settings: &Settings) -> Result<ConnectionHandle, ConnectError> {
        self.registry
            .register_with(DRIVER_NAME, || self.loader.load(&settings.cert_path))
            .map_err(|source| ConnectError::RegisterDriver {
                driver: DRIVER_NAME,
                source,
            })?;

        let dsn = ConnectionString::from_settings(settings);
        tracing::info!(driver = DRIVER_NAME, dsn = %dsn, "Opening database connection");

        let mut pool = self
            .registry
            .get(DRIVER_NAME)
            .and_then(|driver| driver.open(&dsn))
            .map_err(ConnectError::Open)?;

        configure_pool(pool.as_mut(), &settings.pool, settings.override_policy)?;

        pool.ping().await.map_err(ConnectError::Ping)?;
        tracing::info!(driver = DRIVER_NAME, host = %settings.host, "Database ping succeeded");

        let orm = pool.into_orm().map_err(ConnectError::Wrap)?;

        Ok(ConnectionHandle::new(orm, DRIVER_NAME))
    }
}

/// Push the pool-tuning settings selected by `policy` down to `pool`
///
/// # Errors
///
/// Returns `ConnectError::Configure` naming the setting the pool rejected.
pub fn configure_pool(
    pool: &mut dyn SqlPool,
    settings: &PoolSettings,
    policy: OverridePolicy,
) -> Result<(), ConnectError> {
    apply(settings.max_open_conns.override_value(policy), "max_open_conns", |max| {
        pool.set_max_open_conns(max)
    })?;
    apply(settings.max_idle_conns.override_value(policy), "max_idle_conns", |max| {
        pool.set_max_idle_conns(max)
    })?;
    apply(settings.conn_max_lifetime.override_value(policy), "conn_max_lifetime", |mins| {
        pool.set_conn_max_lifetime(minutes(mins))
    })?;
    apply(settings.conn_max_idle_time.override_value(policy), "conn_max_idle_time", |mins| {
        pool.set_conn_max_idle_time(minutes(mins))
    })?;
    Ok(())
}

fn apply(
    value: Option<u32>,
    setting: &'static str,
    set: impl FnOnce(u32) -> Result<(), PoolError>,
) -> Result<(), ConnectError> {
    let Some(value) = value else {
        tracing::debug!(setting, "Leaving pool setting at driver default");
        return Ok(());
    };
    set(value).map_err(|source| ConnectError::Configure { setting, source })?;
    tracing::info!(setting, value, "Applied pool setting");
    Ok(())
}
