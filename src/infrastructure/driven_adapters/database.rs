//! Database Connection Management
//!
//! Wires the connection factory to the process-wide driver registry and
//! exposes both the owned [`connect`] API and the process-wide handle
//! accessors [`init_db`] / [`get_db`].

use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::OnceCell;

use super::alloydb_driver::AlloyDbDriverLoader;
use super::config::SettingsLoader;
use crate::application::driver_registry::DriverRegistry;
use crate::application::use_cases::ConnectDatabaseUseCase;
use crate::domain::models::connection::ConnectionHandle;
use crate::domain::models::settings::Settings;
use crate::shared::errors::{ConfigError, ConnectError};

static DRIVERS: Lazy<Arc<DriverRegistry>> = Lazy::new(|| Arc::new(DriverRegistry::new()));

static DATABASE: DatabaseSlot = DatabaseSlot::new();

/// The process-wide driver registry
#[must_use]
pub fn driver_registry() -> Arc<DriverRegistry> {
    DRIVERS.clone()
}

/// Build a connection handle from `settings` using the AlloyDB driver
///
/// # Errors
///
/// Returns the `ConnectError` of the stage that failed.
pub async fn connect(settings: &Settings) -> Result<ConnectionHandle, ConnectError> {
    ConnectDatabaseUseCase::new(driver_registry(), Arc::new(AlloyDbDriverLoader))
        .execute(settings)
        .await
}

/// Initialize the process-wide handle from the environment
///
/// Calling this again after a successful initialization is a no-op.
///
/// # Errors
///
/// Returns `ConnectError::Config` when configuration is missing or invalid,
/// otherwise the `ConnectError` of the stage that failed.
pub async fn init_db() -> Result<(), ConnectError> {
    let use_case = ConnectDatabaseUseCase::new(driver_registry(), Arc::new(AlloyDbDriverLoader));
    DATABASE
        .init(&use_case, || SettingsLoader::from_env().load())
        .await
        .map(|_| ())
}

/// The process-wide handle, or `None` before [`init_db`] has succeeded
#[must_use]
pub fn get_db() -> Option<&'static ConnectionHandle> {
    DATABASE.get()
}

/// A handle cell written at most once
pub struct DatabaseSlot {
    cell: OnceCell<ConnectionHandle>,
}

impl DatabaseSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Run the factory unless the slot is already filled
    ///
    /// Concurrent callers wait for a single initialization. A failed
    /// initialization leaves the slot empty.
    ///
    /// # Errors
    ///
    /// Returns the error from `settings` or from the factory.
    pub async fn init<F>(
        &self,
        use_case: &ConnectDatabaseUseCase,
        settings: F,
    ) -> Result<&ConnectionHandle, ConnectError>
    where
        F: FnOnce() -> Result<Settings, ConfigError>,
    {
        if let Some(handle) = self.cell.get() {
            tracing::debug!("Database already initialized");
            return Ok(handle);
        }

        self.cell
            .get_or_try_init(|| async {
                let settings = settings()?;
                let handle = use_case.execute(&settings).await?;
                tracing::info!(driver = handle.driver(), "Database initialized");
                Ok::<_, ConnectError>(handle)
            })
            .await
    }

    #[must_use]
    pub fn get(&self) -> Option<&ConnectionHandle> {
        self.cell.get()
    }
}

impl Default for DatabaseSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateways::driver::{MockDriver, MockDriverLoader};
    use crate::domain::gateways::{Driver, SqlPool};
    use crate::shared::errors::PoolError;
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubPool {
        ping_fails: bool,
    }

    #[async_trait]
    impl SqlPool for StubPool {
        fn set_max_open_conns(&mut self, _max: u32) -> Result<(), PoolError> {
            Ok(())
        }

        fn set_max_idle_conns(&mut self, _max: u32) -> Result<(), PoolError> {
            Ok(())
        }

        fn set_conn_max_lifetime(&mut self, _lifetime: Duration) -> Result<(), PoolError> {
            Ok(())
        }

        fn set_conn_max_idle_time(&mut self, _idle: Duration) -> Result<(), PoolError> {
            Ok(())
        }

        async fn ping(&mut self) -> Result<(), PoolError> {
            // let a concurrent initializer run while this one is in flight
            tokio::task::yield_now().await;
            if self.ping_fails {
                return Err(PoolError::Sqlx(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }

        fn into_orm(&mut self) -> Result<DatabaseConnection, PoolError> {
            Ok(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
        }
    }

    fn use_case(ping_fails: bool, opens: Arc<AtomicUsize>) -> ConnectDatabaseUseCase {
        let mut driver = MockDriver::new();
        driver.expect_open().returning(move |_| {
            opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubPool { ping_fails }) as Box<dyn SqlPool>)
        });
        let driver: Arc<dyn Driver> = Arc::new(driver);

        let mut loader = MockDriverLoader::new();
        loader.expect_load().returning(move |_| Ok(driver.clone()));

        ConnectDatabaseUseCase::new(Arc::new(DriverRegistry::new()), Arc::new(loader))
    }

    fn settings() -> Result<Settings, ConfigError> {
        Ok(Settings::new("10.0.0.5", "app", "secret", "inventory", "/keys/sa.json"))
    }

    #[tokio::test]
    async fn should_leave_slot_unset_when_ping_fails() {
        let slot = DatabaseSlot::new();

        let err = slot
            .init(&use_case(true, Arc::new(AtomicUsize::new(0))), settings)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectError::Ping(_)));
        assert!(slot.get().is_none());
    }

    #[tokio::test]
    async fn should_leave_slot_unset_when_config_is_missing() {
        let slot = DatabaseSlot::new();
        let opens = Arc::new(AtomicUsize::new(0));

        let err = slot
            .init(&use_case(false, opens.clone()), || {
                Err(ConfigError::Missing("DB_HOST"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectError::Config(ConfigError::Missing("DB_HOST"))));
        assert_eq!(opens.load(Ordering::SeqCst), 0);
        assert!(slot.get().is_none());
    }

    #[tokio::test]
    async fn should_initialize_once() {
        let slot = DatabaseSlot::new();
        let opens = Arc::new(AtomicUsize::new(0));
        let use_case = use_case(false, opens.clone());

        slot.init(&use_case, settings).await.unwrap();
        slot.init(&use_case, settings).await.unwrap();

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(slot.get().map(ConnectionHandle::driver), Some("alloydb"));
    }

    #[tokio::test]
    async fn should_initialize_once_under_concurrent_callers() {
        let slot = DatabaseSlot::new();
        let opens = Arc::new(AtomicUsize::new(0));
        let use_case = use_case(false, opens.clone());

        let (first, second) = tokio::join!(
            slot.init(&use_case, settings),
            slot.init(&use_case, settings)
        );

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(std::ptr::eq(first.unwrap(), second.unwrap()));
    }

    #[tokio::test]
    async fn should_allow_retry_after_failed_initialization() {
        let slot = DatabaseSlot::new();
        let opens = Arc::new(AtomicUsize::new(0));

        assert!(slot.init(&use_case(true, opens.clone()), settings).await.is_err());
        assert!(slot.init(&use_case(false, opens.clone()), settings).await.is_ok());

        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert!(slot.get().is_some());
    }

    #[test]
    fn should_return_none_before_initialization() {
        assert!(DatabaseSlot::default().get().is_none());
    }
}
