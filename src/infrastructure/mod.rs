//! Infrastructure Layer
//!
//! Contains all external concerns: environment configuration, the database
//! driver and the process-wide connection handle.

pub mod driven_adapters;
