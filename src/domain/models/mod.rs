//! Domain Models
//!
//! Configuration, credential and connection types.

pub mod connection;
pub mod credentials;
pub mod settings;

pub use connection::{ConnectionHandle, ConnectionString};
pub use credentials::{CredentialKind, Credentials};
pub use settings::{OverridePolicy, ParseMode, PoolSetting, PoolSettings, Settings};
