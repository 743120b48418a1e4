//! SDK configuration.
//!
//! Defaults target the public service desk API; every value can be
//! overridden from the environment (`SERVICEDESK_*`) or set directly.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::storage::PREFERENCES_FILE;

pub const DEFAULT_BASE_URL: &str = "https://pyrus.com/servicedeskapi/v1";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_USER_NAME: &str = "Guest";

const APP_ID_VAR: &str = "SERVICEDESK_APP_ID";
const API_URL_VAR: &str = "SERVICEDESK_API_URL";
const USER_NAME_VAR: &str = "SERVICEDESK_USER_NAME";
const DATA_DIR_VAR: &str = "SERVICEDESK_DATA_DIR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Application id is not set (SERVICEDESK_APP_ID)")]
    MissingAppId,
    #[error("Invalid API URL {0}: must start with http:// or https://")]
    InvalidBaseUrl(String),
    #[error("No data directory available; set SERVICEDESK_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SdkConfig {
    pub app_id: String,
    pub base_url: String,
    /// Author name sent with every ticket and comment.
    pub user_name: String,
    /// Directory holding the preference file.
    pub data_dir: PathBuf,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl SdkConfig {
    /// Configuration with default endpoints and storage for `app_id`.
    pub fn new(app_id: impl Into<String>) -> Result<Self, ConfigError> {
        let data_dir = default_data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(Self {
            app_id: app_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_name: DEFAULT_USER_NAME.to_string(),
            data_dir,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Read the configuration from `SERVICEDESK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app_id = var(APP_ID_VAR).ok_or(ConfigError::MissingAppId)?;
        let data_dir = match var(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };
        let config = Self {
            app_id,
            base_url: var(API_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_name: var(USER_NAME_VAR).unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            data_dir,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE)
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("servicedesk"))
}
