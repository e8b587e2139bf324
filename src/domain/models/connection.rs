//! Connection Models
//!
//! The connection string handed to a driver and the handle produced once a
//! pool has been opened, verified and wrapped.

use sea_orm::{DatabaseConnection, DbErr};
use sqlx::postgres::PgSslMode;
use zeroize::Zeroizing;

use super::settings::Settings;

/// Connection parameters assembled from the required settings
#[derive(Clone)]
pub struct ConnectionString {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Zeroizing<String>,
    pub database: String,
    pub ssl_mode: PgSslMode,
}

impl ConnectionString {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            user: settings.user.clone(),
            password: settings.password.clone(),
            database: settings.database.clone(),
            ssl_mode: settings.ssl_mode,
        }
    }
}

/// Keyword/value form with the password masked, suitable for logs
impl std::fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "host={} port={} user={} password=*** dbname={} sslmode={}",
            self.host,
            self.port,
            self.user,
            self.database,
            ssl_mode_name(self.ssl_mode)
        )
    }
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionString({self})")
    }
}

/// `sslmode` keyword for a TLS mode
#[must_use]
pub fn ssl_mode_name(mode: PgSslMode) -> &'static str {
    match mode {
        PgSslMode::Disable => "disable",
        PgSslMode::Allow => "allow",
        PgSslMode::Prefer => "prefer",
        PgSslMode::Require => "require",
        PgSslMode::VerifyCa => "verify-ca",
        PgSslMode::VerifyFull => "verify-full",
    }
}

/// A live pooled connection wrapped in the ORM
#[derive(Debug)]
pub struct ConnectionHandle {
    orm: DatabaseConnection,
    driver: String,
}

impl ConnectionHandle {
    #[must_use]
    pub fn new(orm: DatabaseConnection, driver: impl Into<String>) -> Self {
        Self {
            orm,
            driver: driver.into(),
        }
    }

    /// The ORM connection used to issue queries
    #[must_use]
    pub fn orm(&self) -> &DatabaseConnection {
        &self.orm
    }

    /// Name of the driver the pool was opened through
    #[must_use]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Close the underlying pool
    ///
    /// # Errors
    ///
    /// Returns the ORM error if the pool cannot be closed cleanly.
    pub async fn close(self) -> Result<(), DbErr> {
        tracing::info!(driver = %self.driver, "Closing database connection");
        self.orm.close().await
    }
}
