//! Connection Settings Model
//!
//! The configuration record resolved once at startup: required connection
//! values plus the four pool-tuning settings and the policies that govern them.

use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::PgSslMode;
use zeroize::Zeroizing;

use crate::shared::errors::ConfigError;

/// Default maximum open connections (0 means unlimited)
pub const DEFAULT_MAX_OPEN_CONNS: u32 = 0;
/// Default maximum idle connections
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 2;
/// Default maximum connection lifetime in minutes (0 means unlimited)
pub const DEFAULT_CONN_MAX_LIFETIME_MINS: u32 = 0;
/// Default maximum connection idle time in minutes (0 means unlimited)
pub const DEFAULT_CONN_MAX_IDLE_TIME_MINS: u32 = 0;
/// Port used when `DB_HOST` carries none
pub const DEFAULT_PORT: u16 = 5432;

/// How malformed optional numeric values are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Reject the value with a configuration error
    #[default]
    Strict,
    /// Resolve the value to 0 and carry on
    Lenient,
}

/// When a pool-tuning setting is pushed down to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Apply only settings the operator explicitly provided
    #[default]
    Explicit,
    /// Apply only settings whose value differs from the documented default,
    /// even when the operator provided the default value explicitly
    NonDefault,
}

/// A resolved pool-tuning value together with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSetting {
    value: u32,
    default: u32,
    provided: bool,
}

impl PoolSetting {
    /// A setting that was absent from configuration
    #[must_use]
    pub fn defaulted(default: u32) -> Self {
        Self {
            value: default,
            default,
            provided: false,
        }
    }

    /// A setting the operator provided
    #[must_use]
    pub fn provided(value: u32, default: u32) -> Self {
        Self {
            value,
            default,
            provided: true,
        }
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub fn is_provided(&self) -> bool {
        self.provided
    }

    /// The value to push to the pool under `policy`, or `None` to leave the
    /// driver's own default in place
    #[must_use]
    pub fn override_value(&self, policy: OverridePolicy) -> Option<u32> {
        let apply = match policy {
            OverridePolicy::Explicit => self.provided,
            OverridePolicy::NonDefault => self.value != self.default,
        };
        apply.then_some(self.value)
    }
}

/// The four optional pool-tuning settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_open_conns: PoolSetting,
    pub max_idle_conns: PoolSetting,
    /// Minutes
    pub conn_max_lifetime: PoolSetting,
    /// Minutes
    pub conn_max_idle_time: PoolSetting,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open_conns: PoolSetting::defaulted(DEFAULT_MAX_OPEN_CONNS),
            max_idle_conns: PoolSetting::defaulted(DEFAULT_MAX_IDLE_CONNS),
            conn_max_lifetime: PoolSetting::defaulted(DEFAULT_CONN_MAX_LIFETIME_MINS),
            conn_max_idle_time: PoolSetting::defaulted(DEFAULT_CONN_MAX_IDLE_TIME_MINS),
        }
    }
}

/// Convert a minutes setting into a duration
#[must_use]
pub fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value) * 60)
}

/// Resolved connection settings
#[derive(Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Zeroizing<String>,
    pub database: String,
    pub cert_path: PathBuf,
    pub ssl_mode: PgSslMode,
    pub pool: PoolSettings,
    pub override_policy: OverridePolicy,
}

impl Settings {
    /// Create settings with default pool tuning and TLS mode
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        cert_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: Zeroizing::new(password.into()),
            database: database.into(),
            cert_path: cert_path.into(),
            ssl_mode: PgSslMode::Prefer,
            pool: PoolSettings::default(),
            override_policy: OverridePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_ssl_mode(mut self, ssl_mode: PgSslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn with_override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("cert_path", &self.cert_path)
            .field("ssl_mode", &self.ssl_mode)
            .field("pool", &self.pool)
            .field("override_policy", &self.override_policy)
            .finish()
    }
}

/// Split `host`, `host:port` or `[v6]:port` into host and port
///
/// AlloyDB instance URIs (`projects/<p>/locations/<r>/clusters/<c>/instances/<i>`)
/// are rejected: pools dial an address directly and cannot resolve them.
///
/// # Errors
///
/// Returns `ConfigError::InvalidHost` if the value is an instance URI or a
/// port is present but not a valid `u16`.
pub fn split_host_port(raw: &str) -> Result<(String, u16), ConfigError> {
    if raw.contains('/') {
        return Err(invalid_host(
            raw,
            "dialing by instance URI is not supported, use the instance address as host[:port]",
        ));
    }

    if let Some(rest) = raw.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            return match tail.strip_prefix(':') {
                Some(port) => Ok((host.to_string(), parse_port(raw, port)?)),
                None if tail.is_empty() => Ok((host.to_string(), DEFAULT_PORT)),
                None => Err(invalid_host(raw, "unexpected text after bracketed address")),
            };
        }
    }

    match raw.split_once(':') {
        // Bare IPv6 literal
        Some((_, rest)) if rest.contains(':') => Ok((raw.to_string(), DEFAULT_PORT)),
        Some((host, port)) => Ok((host.to_string(), parse_port(raw, port)?)),
        None => Ok((raw.to_string(), DEFAULT_PORT)),
    }
}

fn parse_port(raw: &str, port: &str) -> Result<u16, ConfigError> {
    port.parse()
        .map_err(|_| invalid_host(raw, "port is not a number between 0 and 65535"))
}

fn invalid_host(raw: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidHost {
        value: raw.to_string(),
        reason,
    }
}
