//! AlloyDB Driver
//!
//! sqlx-backed implementation of the driver gateways. Pools are assembled
//! lazily: tuning is collected on `PgPoolOptions` and the pool is only
//! connected when it is first pinged.
//!
//! sqlx cannot cap idle connections. The max-idle setting becomes
//! `min_connections`, a floor of warm connections clamped to the open limit,
//! so `DB_MAX_IDLE_CONNS=10` keeps ten connections open even when the pool is
//! quiet. Leave it unset to keep sqlx's floor of zero.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, SqlxPostgresConnector};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};

use crate::domain::gateways::{Driver, DriverLoader, SqlPool};
use crate::domain::models::connection::ConnectionString;
use crate::domain::models::credentials::Credentials;
use crate::shared::errors::{DriverError, PoolError};

/// `application_name` reported to the server
pub const APPLICATION_NAME: &str = concat!("alloydb-connector/", env!("CARGO_PKG_VERSION"));

/// Loads credential files into [`AlloyDbDriver`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct AlloyDbDriverLoader;

impl DriverLoader for AlloyDbDriverLoader {
    fn load(&self, credentials_path: &Path) -> Result<Arc<dyn Driver>, DriverError> {
        let credentials = Credentials::from_file(credentials_path)?;
        tracing::info!(
            kind = credentials.kind().as_str(),
            project_id = credentials.project_id().unwrap_or("-"),
            principal = credentials.principal().unwrap_or("-"),
            "Loaded driver credentials"
        );
        Ok(Arc::new(AlloyDbDriver::new(credentials)))
    }
}

/// Driver opening sqlx PostgreSQL pools with the registered credentials
#[derive(Debug)]
pub struct AlloyDbDriver {
    credentials: Credentials,
}

impl AlloyDbDriver {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl Driver for AlloyDbDriver {
    fn open(&self, dsn: &ConnectionString) -> Result<Box<dyn SqlPool>, DriverError> {
        tracing::debug!(
            principal = self.credentials.principal().unwrap_or("-"),
            dsn = %dsn,
            "Preparing connection pool"
        );

        let options = PgConnectOptions::new_without_pgpass()
            .host(&dsn.host)
            .port(dsn.port)
            .username(&dsn.user)
            .password(&dsn.password)
            .database(&dsn.database)
            .ssl_mode(dsn.ssl_mode)
            .application_name(APPLICATION_NAME);

        Ok(Box::new(SqlxPool::new(options)))
    }
}

/// A sqlx pool that is configured before it is connected
pub struct SqlxPool {
    connect_options: PgConnectOptions,
    pool_options: PgPoolOptions,
    max_idle: Option<u32>,
    pool: Option<PgPool>,
}

impl SqlxPool {
    #[must_use]
    pub fn new(connect_options: PgConnectOptions) -> Self {
        Self {
            connect_options,
            pool_options: PgPoolOptions::new(),
            max_idle: None,
            pool: None,
        }
    }

    /// Pool options as they will be used on open
    #[must_use]
    pub fn pool_options(&self) -> &PgPoolOptions {
        &self.pool_options
    }

    /// Options the pool is connected with, including the idle floor
    fn open_options(&self) -> PgPoolOptions {
        let options = self.pool_options.clone();
        match self.max_idle {
            Some(idle) => {
                let max = options.get_max_connections();
                options.min_connections(idle.min(max))
            }
            None => options,
        }
    }

    fn ensure_closed(&self) -> Result<(), PoolError> {
        if self.pool.is_some() {
            return Err(PoolError::AlreadyOpen);
        }
        Ok(())
    }

    fn update(&mut self, f: impl FnOnce(PgPoolOptions) -> PgPoolOptions) -> Result<(), PoolError> {
        self.ensure_closed()?;
        self.pool_options = f(self.pool_options.clone());
        Ok(())
    }
}

fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}

#[async_trait]
impl SqlPool for SqlxPool {
    fn set_max_open_conns(&mut self, max: u32) -> Result<(), PoolError> {
        if max == 0 {
            // sqlx pools are always bounded
            self.ensure_closed()?;
            tracing::debug!(
                max_connections = self.pool_options.get_max_connections(),
                "Unlimited open connections requested, keeping driver limit"
            );
            return Ok(());
        }
        self.update(|options| options.max_connections(max))
    }

    fn set_max_idle_conns(&mut self, max: u32) -> Result<(), PoolError> {
        self.ensure_closed()?;
        if max > 0 {
            tracing::warn!(
                max_idle_conns = max,
                "sqlx cannot cap idle connections; keeping this many connections open as a minimum"
            );
        }
        self.max_idle = Some(max);
        Ok(())
    }

    fn set_conn_max_lifetime(&mut self, lifetime: Duration) -> Result<(), PoolError> {
        self.update(|options| options.max_lifetime(non_zero(lifetime)))
    }

    fn set_conn_max_idle_time(&mut self, idle: Duration) -> Result<(), PoolError> {
        self.update(|options| options.idle_timeout(non_zero(idle)))
    }

    async fn ping(&mut self) -> Result<(), PoolError> {
        let pool = match &self.pool {
            Some(pool) => pool.clone(),
            None => {
                let pool = self
                    .open_options()
                    .connect_with(self.connect_options.clone())
                    .await?;
                self.pool = Some(pool.clone());
                pool
            }
        };

        let mut conn = pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    fn into_orm(&mut self) -> Result<DatabaseConnection, PoolError> {
        self.pool
            .take()
            .map(SqlxPostgresConnector::from_sqlx_postgres_pool)
            .ok_or(PoolError::NotOpen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::settings::Settings;

    fn test_pool() -> SqlxPool {
        let settings = Settings::new("127.0.0.1", "app", "secret", "inventory", "/keys/sa.json");
        let dsn = ConnectionString::from_settings(&settings);
        SqlxPool::new(
            PgConnectOptions::new_without_pgpass()
                .host(&dsn.host)
                .port(dsn.port),
        )
    }

    #[test]
    fn should_keep_driver_limit_for_unlimited_open_conns() {
        let mut pool = test_pool();
        let driver_default = pool.pool_options().get_max_connections();

        pool.set_max_open_conns(0).unwrap();

        assert_eq!(pool.pool_options().get_max_connections(), driver_default);
    }

    #[test]
    fn should_apply_limits_and_timeouts() {
        let mut pool = test_pool();

        pool.set_max_open_conns(25).unwrap();
        pool.set_conn_max_lifetime(Duration::from_secs(1800)).unwrap();
        pool.set_conn_max_idle_time(Duration::ZERO).unwrap();

        let options = pool.pool_options();
        assert_eq!(options.get_max_connections(), 25);
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(1800)));
        assert_eq!(options.get_idle_timeout(), None);
    }

    #[test]
    fn should_clamp_idle_floor_to_open_limit() {
        let mut pool = test_pool();

        pool.set_max_open_conns(4).unwrap();
        pool.set_max_idle_conns(10).unwrap();

        assert_eq!(pool.open_options().get_min_connections(), 4);
    }

    #[test]
    fn should_keep_zero_idle_floor_when_idle_unset() {
        let mut pool = test_pool();

        pool.set_max_open_conns(4).unwrap();

        assert_eq!(pool.open_options().get_min_connections(), 0);
    }

    #[test]
    fn should_refuse_orm_wrap_before_ping() {
        let mut pool = test_pool();

        assert!(matches!(pool.into_orm(), Err(PoolError::NotOpen)));
    }

    #[test]
    fn should_fail_to_load_missing_credentials() {
        let result = AlloyDbDriverLoader.load(Path::new("/nonexistent/alloydb-key.json"));

        assert!(matches!(result, Err(DriverError::Credentials(_))));
    }

    #[test]
    fn should_load_driver_from_credentials_file() {
        let path = std::env::temp_dir().join(format!("alloydb-key-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"type": "service_account", "client_email": "sa@demo.iam.gserviceaccount.com", "private_key": "key"}"#,
        )
        .unwrap();

        let driver = AlloyDbDriverLoader.load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(driver.is_ok());
    }
}
