use std::path::PathBuf;

use thiserror::Error;

use movember_upload::UploadError;
use strava_client::StravaError;
use strava_download::DownloadError;

use crate::secrets::SecretError;

const CONFIGURE_HINT: &str = "please run \"strava_to_movember configure\"";

/// Anything that stops a sync before the first request goes out.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Profile '{0}' doesn't exist, {hint}", hint = CONFIGURE_HINT)]
    ProfileNotFound(String),
    #[error("Missing Movember email for profile '{0}', {hint}", hint = CONFIGURE_HINT)]
    MissingEmail(String),
    #[error("Missing Movember password for profile '{0}', {hint}", hint = CONFIGURE_HINT)]
    MissingPassword(String),
    #[error("Unable to read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config file {path} is not valid: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Unable to write config file {path}: {source}")]
    Unwritable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error(transparent)]
    Secret(#[from] SecretError),
}

/// Every way a run can fail. None of them are retried.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<StravaError> for SyncError {
    fn from(e: StravaError) -> Self {
        match e {
            StravaError::Unauthorized { .. } | StravaError::InvalidToken => {
                SyncError::Authentication(e.to_string())
            }
            StravaError::Payload(_) => SyncError::Parse(e.to_string()),
            StravaError::Status { .. } | StravaError::Transport(_) | StravaError::InvalidUrl(_) => {
                SyncError::Transport(e.to_string())
            }
        }
    }
}

impl From<DownloadError> for SyncError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::Strava(e) => e.into(),
            DownloadError::StartDate { .. } => SyncError::Parse(e.to_string()),
        }
    }
}

impl From<UploadError> for SyncError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Authentication(_) => SyncError::Authentication(e.to_string()),
            UploadError::Status { .. } | UploadError::Transport(_) | UploadError::InvalidUrl(_) => {
                SyncError::Transport(e.to_string())
            }
        }
    }
}
