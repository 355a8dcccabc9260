//! Where the Movember password lives. The rest of the crate only sees
//! the [`SecretStore`] trait, so the OS keyring can be swapped for the
//! environment or an in-memory map.

use std::cell::RefCell;
use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::APP_NAME;

/// Key under which the Movember password is stored for every profile.
pub const PASSWORD_KEY: &str = "movember_password";

/// Environment variable read by [`EnvSecretStore`].
pub const MOVEMBER_PASSWORD_ENV: &str = "MOVEMBER_PASSWORD";

/// Selects the backend used by [`secret_store_from_env`].
pub const SECRET_BACKEND_ENV: &str = "STRAVA_TO_MOVEMBER_SECRET_BACKEND";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret store error: {0}")]
    Backend(String),
    #[error("The {0} secret store is read-only")]
    ReadOnly(&'static str),
    #[error("Unknown secret store '{0}', expected 'keyring' or 'env'")]
    UnknownBackend(String),
}

pub trait SecretStore {
    fn get_secret(&self, service: &str, key: &str) -> Result<Option<String>, SecretError>;
    fn set_secret(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError>;
}

/// Secrets are grouped per profile, e.g. `strava_to_movember_default`.
pub fn service_name(profile: &str) -> String {
    format!("{}_{}", APP_NAME, profile)
}

/// The platform credential store: macOS Keychain, Windows Credential
/// Manager, or the Secret Service on Linux with keyutils as a cache in
/// front of it, so passwords survive a reboot.
#[derive(Debug, Default)]
pub struct KeyringSecretStore;

impl SecretStore for KeyringSecretStore {
    fn get_secret(&self, service: &str, key: &str) -> Result<Option<String>, SecretError> {
        let entry = keyring::Entry::new(service, key).map_err(|e| SecretError::Backend(e.to_string()))?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => {
                debug!("No {} stored for {}", key, service);
                Ok(None)
            }
            Err(e) => Err(SecretError::Backend(e.to_string())),
        }
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError> {
        let entry = keyring::Entry::new(service, key).map_err(|e| SecretError::Backend(e.to_string()))?;
        entry
            .set_password(value)
            .map_err(|e| SecretError::Backend(e.to_string()))
    }
}

/// Reads the password from `MOVEMBER_PASSWORD`, for hosts without a
/// credential store. Nothing can be written back.
pub struct EnvSecretStore {
    lookup: Box<dyn Fn(&str) -> Option<String>>,
}

impl EnvSecretStore {
    pub fn new() -> EnvSecretStore {
        EnvSecretStore::with_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `new()` but reads variables through `lookup`, which keeps
    /// tests away from the process environment.
    pub fn with_lookup<F>(lookup: F) -> EnvSecretStore
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        EnvSecretStore {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, _service: &str, key: &str) -> Result<Option<String>, SecretError> {
        if key != PASSWORD_KEY {
            return Ok(None);
        }
        Ok((self.lookup)(MOVEMBER_PASSWORD_ENV))
    }

    fn set_secret(&self, _service: &str, _key: &str, _value: &str) -> Result<(), SecretError> {
        Err(SecretError::ReadOnly("environment"))
    }
}

/// Keeps secrets in process memory only.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RefCell<HashMap<(String, String), String>>,
}

impl MemorySecretStore {
    pub fn new() -> MemorySecretStore {
        Default::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, service: &str, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self
            .secrets
            .borrow()
            .get(&(String::from(service), String::from(key)))
            .cloned())
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError> {
        self.secrets
            .borrow_mut()
            .insert((String::from(service), String::from(key)), String::from(value));
        Ok(())
    }
}

/// Picks the backend named by `STRAVA_TO_MOVEMBER_SECRET_BACKEND`,
/// defaulting to the OS keyring.
pub fn secret_store_from_env() -> Result<Box<dyn SecretStore>, SecretError> {
    secret_store_named(std::env::var(SECRET_BACKEND_ENV).ok().as_deref())
}

fn secret_store_named(name: Option<&str>) -> Result<Box<dyn SecretStore>, SecretError> {
    match name.map(str::trim) {
        None | Some("") | Some("keyring") => Ok(Box::new(KeyringSecretStore)),
        Some("env") => Ok(Box::new(EnvSecretStore::new())),
        Some(other) => Err(SecretError::UnknownBackend(String::from(other))),
    }
}
