//! Settings Configuration
//!
//! Loads connection settings from `DB_*` environment variables.

use config::{Config, Environment, Map};
use serde::Deserialize;
use sqlx::postgres::PgSslMode;

use crate::domain::models::settings::{
    split_host_port, OverridePolicy, ParseMode, PoolSetting, PoolSettings, Settings,
    DEFAULT_CONN_MAX_IDLE_TIME_MINS, DEFAULT_CONN_MAX_LIFETIME_MINS, DEFAULT_MAX_IDLE_CONNS,
    DEFAULT_MAX_OPEN_CONNS,
};
use crate::shared::errors::ConfigError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DB";

/// Raw `DB_*` values, keyed by the variable name without its prefix
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    host: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    name: Option<String>,
    cert_path: Option<String>,
    max_open_conns: Option<String>,
    max_idle_conns: Option<String>,
    conn_max_lifetime: Option<String>,
    conn_max_idle_time: Option<String>,
    ssl_mode: Option<String>,
}

/// Resolves [`Settings`] from the process environment or an injected map
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    source: Option<Map<String, String>>,
    parse_mode: ParseMode,
    override_policy: OverridePolicy,
}

impl SettingsLoader {
    /// Read from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Read from `vars` instead of the process environment
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    #[must_use]
    pub fn override_policy(mut self, override_policy: OverridePolicy) -> Self {
        self.override_policy = override_policy;
        self
    }

    /// Resolve the settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first required variable that
    /// is absent or empty, `ConfigError::InvalidNumber` for a malformed pool
    /// setting in strict mode, and `ConfigError::InvalidSslMode` /
    /// `ConfigError::InvalidHost` for unusable TLS mode or host values,
    /// including AlloyDB instance URIs given as `DB_HOST`.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let raw: RawSettings = Config::builder()
            // DB_HOST -> host, DB_CERT_PATH -> cert_path
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(self.source.clone()),
            )
            .build()?
            .try_deserialize()?;

        let host = required("DB_HOST", raw.host)?;
        let user = required("DB_USER", raw.user)?;
        let password = required("DB_PASS", raw.pass)?;
        let database = required("DB_NAME", raw.name)?;
        let cert_path = required("DB_CERT_PATH", raw.cert_path)?;

        let pool = PoolSettings {
            max_open_conns: self.pool_setting(
                "DB_MAX_OPEN_CONNS",
                raw.max_open_conns,
                DEFAULT_MAX_OPEN_CONNS,
            )?,
            max_idle_conns: self.pool_setting(
                "DB_MAX_IDLE_CONNS",
                raw.max_idle_conns,
                DEFAULT_MAX_IDLE_CONNS,
            )?,
            conn_max_lifetime: self.pool_setting(
                "DB_CONN_MAX_LIFETIME",
                raw.conn_max_lifetime,
                DEFAULT_CONN_MAX_LIFETIME_MINS,
            )?,
            conn_max_idle_time: self.pool_setting(
                "DB_CONN_MAX_IDLE_TIME",
                raw.conn_max_idle_time,
                DEFAULT_CONN_MAX_IDLE_TIME_MINS,
            )?,
        };

        let ssl_mode = match raw.ssl_mode {
            Some(mode) => mode
                .parse::<PgSslMode>()
                .map_err(|_| ConfigError::InvalidSslMode(mode))?,
            None => PgSslMode::Prefer,
        };

        let (host, port) = split_host_port(&host)?;

        let settings = Settings::new(host, user, password, database, cert_path)
            .with_port(port)
            .with_ssl_mode(ssl_mode)
            .with_pool(pool)
            .with_override_policy(self.override_policy);

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "Database configuration loaded"
        );

        Ok(settings)
    }

    fn pool_setting(
        &self,
        var: &'static str,
        raw: Option<String>,
        default: u32,
    ) -> Result<PoolSetting, ConfigError> {
        let Some(raw) = raw.filter(|v| !v.is_empty()) else {
            return Ok(PoolSetting::defaulted(default));
        };

        match raw.parse::<u32>() {
            Ok(value) => Ok(PoolSetting::provided(value, default)),
            Err(_) => match self.parse_mode {
                ParseMode::Strict => Err(ConfigError::InvalidNumber { var, value: raw }),
                ParseMode::Lenient => {
                    tracing::warn!(var, value = %raw, "Malformed pool setting, using 0");
                    Ok(PoolSetting::provided(0, default))
                }
            },
        }
    }
}

fn required(var: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}
