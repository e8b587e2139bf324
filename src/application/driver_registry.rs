//! Driver Registry
//!
//! Named drivers shared by every connection the process opens. Registering a
//! name that is already present returns the existing driver.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::gateways::Driver;
use crate::shared::errors::DriverError;

/// Registry of drivers keyed by name
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the driver built by `load` under `name`, unless `name` is taken
    ///
    /// `load` runs at most once per name; a failed load registers nothing.
    ///
    /// # Errors
    ///
    /// Returns whatever error `load` returns.
    pub fn register_with<F>(&self, name: &str, load: F) -> Result<Arc<dyn Driver>, DriverError>
    where
        F: FnOnce() -> Result<Arc<dyn Driver>, DriverError>,
    {
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = drivers.get(name) {
            tracing::debug!(driver = name, "Driver already registered");
            return Ok(existing.clone());
        }

        let driver = load()?;
        drivers.insert(name.to_string(), driver.clone());
        tracing::info!(driver = name, "Registered database driver");
        Ok(driver)
    }

    /// Look up a registered driver
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotRegistered` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Driver>, DriverError> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::NotRegistered(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
