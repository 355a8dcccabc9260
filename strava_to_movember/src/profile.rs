
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::secrets::{service_name, SecretStore, PASSWORD_KEY};
use crate::APP_NAME;

/// Profile written by `configure`.
pub const DEFAULT_PROFILE: &str = "default";

pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movember_email: Option<String>,
}

/// The whole config file:
///
/// ```yaml
/// default_profile: default
/// profiles:
///   default:
///     movember_email: mo@example.com
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

fn default_profile_name() -> String {
    String::from(DEFAULT_PROFILE)
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            default_profile: default_profile_name(),
            profiles: BTreeMap::new(),
        }
    }
}

/// Everything needed to log into Movember for one profile.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub profile: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("profile", &self.profile)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `{platform config dir}/strava_to_movember/config.yaml`, e.g.
/// `~/.config/strava_to_movember/config.yaml` on Linux.
pub fn default_config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME)
}

impl ProfileConfig {
    /// Reads the config file. A file that doesn't exist yet, or holds
    /// nothing, is treated as an empty config rather than an error.
    /// Profile names keep their case.
    pub fn load(path: &Path) -> Result<ProfileConfig, ConfigurationError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, starting empty", path.display());
                return Ok(ProfileConfig::default());
            }
            Err(source) => {
                return Err(ConfigurationError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(ProfileConfig::default());
        }
        let profiles: ProfileConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigurationError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            "Loaded {} profile(s) from {}",
            profiles.profiles.len(),
            path.display()
        );
        Ok(profiles)
    }

    /// Writes the config file, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigurationError> {
        let unwritable = |source| ConfigurationError::Unwritable {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(unwritable)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(unwritable)?;
        info!("Stored configuration in {}", path.display());
        Ok(())
    }

    /// Looks up the email for `profile` (or the default profile) and its
    /// password in `store`. Fails without touching the network if any
    /// piece is missing.
    pub fn resolve(
        &self,
        profile: Option<&str>,
        store: &dyn SecretStore,
    ) -> Result<Credentials, ConfigurationError> {
        let name = profile.unwrap_or(&self.default_profile);

        let entry = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigurationError::ProfileNotFound(String::from(name)))?;

        let email = entry
            .movember_email
            .clone()
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| ConfigurationError::MissingEmail(String::from(name)))?;

        let password = store
            .get_secret(&service_name(name), PASSWORD_KEY)?
            .filter(|password| !password.is_empty())
            .ok_or_else(|| ConfigurationError::MissingPassword(String::from(name)))?;

        Ok(Credentials {
            profile: String::from(name),
            email,
            password,
        })
    }

    /// Creates or replaces the email of profile `name`.
    pub fn upsert(&mut self, name: &str, email: &str) {
        self.profiles.insert(
            String::from(name),
            Profile {
                movember_email: Some(String::from(email)),
            },
        );
    }
}

/// Stores `email` as the `default` profile in the config file at `path`
/// and `password` in `store`. Other profiles are left alone; running it
/// again replaces both values.
pub fn configure(
    path: &Path,
    store: &dyn SecretStore,
    email: &str,
    password: &str,
) -> Result<ProfileConfig, ConfigurationError> {
    let mut profiles = ProfileConfig::load(path)?;
    profiles.upsert(DEFAULT_PROFILE, email);
    store.set_secret(&service_name(DEFAULT_PROFILE), PASSWORD_KEY, password)?;
    profiles.save(path)?;
    Ok(profiles)
}
