//! AlloyDB Connector
//!
//! Connection bootstrap for AlloyDB/PostgreSQL: resolves `DB_*` settings,
//! registers the driver with its credentials, opens and tunes a sqlx pool,
//! verifies it and wraps it in a sea-orm connection.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use domain::models::{ConnectionHandle, OverridePolicy, ParseMode, Settings};
pub use infrastructure::driven_adapters::{connect, get_db, init_db, SettingsLoader};
pub use shared::errors::{ConfigError, ConnectError};

/// Crate version, `v`-prefixed
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Current version number
#[must_use]
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_v_prefixed() {
        assert_eq!(version(), "v1.0.0");
    }
}
