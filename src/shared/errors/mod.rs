//! Error Types
//!
//! Stage-identifying error types for connection bootstrap.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors raised while resolving settings from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Fatal Error: {0} environment variable not set.")]
    Missing(&'static str),

    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("DB_SSL_MODE has unknown value '{0}'")]
    InvalidSslMode(String),

    #[error("DB_HOST '{value}' is invalid: {reason}")]
    InvalidHost { value: String, reason: &'static str },

    #[error("Failed to read configuration source: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    /// Name of the environment variable this error refers to, if any
    #[must_use]
    pub fn variable(&self) -> Option<&'static str> {
        match self {
            Self::Missing(var) | Self::InvalidNumber { var, .. } => Some(*var),
            Self::InvalidSslMode(_) => Some("DB_SSL_MODE"),
            Self::InvalidHost { .. } => Some("DB_HOST"),
            Self::Source(_) => None,
        }
    }
}

/// Errors loading the credential file handed to the driver
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Credentials of type {kind} are missing field '{field}'")]
    MissingField { kind: &'static str, field: &'static str },
}

/// Driver registry and driver-level errors
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Driver '{0}' is not registered")]
    NotRegistered(String),
}

/// Errors reported by a connection pool
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Pool is already open; settings can no longer change")]
    AlreadyOpen,

    #[error("Pool has not been opened")]
    NotOpen,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Errors returned by the connection factory, one variant per stage
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to register {driver} driver: {source}")]
    RegisterDriver {
        driver: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("failed to open database: {0}")]
    Open(#[source] DriverError),

    #[error("failed to configure pool setting {setting}: {source}")]
    Configure {
        setting: &'static str,
        #[source]
        source: PoolError,
    },

    #[error("failed to ping database: {0}")]
    Ping(#[source] PoolError),

    #[error("failed to create orm instance: {0}")]
    Wrap(#[source] PoolError),
}

impl ConnectError {
    /// Stable name of the stage that failed
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::RegisterDriver { .. } => "register",
            Self::Open(_) => "open",
            Self::Configure { .. } => "configure",
            Self::Ping(_) => "ping",
            Self::Wrap(_) => "wrap",
        }
    }
}
