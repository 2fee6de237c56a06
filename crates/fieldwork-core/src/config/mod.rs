//! Client configuration for the field app.
//!
//! Values are resolved from explicit overrides (command-line flags), then the
//! environment, then the persisted JSON config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::location::DEFAULT_GPS_TIMEOUT;
use crate::util::{normalize_base_url, normalize_text_option};
use crate::{Error, Result};

pub const ENV_API_URL: &str = "FIELDWORK_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "FIELDWORK_ACCESS_TOKEN";
pub const ENV_DB_PATH: &str = "FIELDWORK_DB_PATH";
pub const ENV_GPS_COMMAND: &str = "FIELDWORK_GPS_COMMAND";
pub const ENV_GPS_TIMEOUT_SECS: &str = "FIELDWORK_GPS_TIMEOUT_SECS";

/// Contents of `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfigFile {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub gps_command: Option<String>,
    #[serde(default)]
    pub gps_timeout_secs: Option<u64>,
}

impl FieldConfigFile {
    /// Missing file yields the empty config.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|error| {
            Error::Configuration(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

/// Values given explicitly for this run
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub access_token: Option<String>,
    pub db_path: Option<PathBuf>,
    pub gps_command: Option<String>,
    pub gps_timeout_secs: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    pub api_base_url: Option<String>,
    pub access_token: Option<String>,
    pub db_path: Option<PathBuf>,
    pub gps_command: Option<String>,
    pub gps_timeout: Duration,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            access_token: None,
            db_path: None,
            gps_command: None,
            gps_timeout: DEFAULT_GPS_TIMEOUT,
        }
    }
}

impl FieldConfig {
    /// Merge overrides, environment (read through `env`), and file values.
    pub fn resolve(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
        file: FieldConfigFile,
    ) -> Result<Self> {
        let pick = |explicit: Option<String>, key: &str, stored: Option<String>| {
            normalize_text_option(explicit)
                .or_else(|| normalize_text_option(env(key)))
                .or_else(|| normalize_text_option(stored))
        };

        let api_base_url = pick(overrides.api_base_url, ENV_API_URL, file.api_base_url)
            .map(|raw| normalize_base_url(&raw))
            .transpose()
            .map_err(Error::Configuration)?;
        let access_token = pick(overrides.access_token, ENV_ACCESS_TOKEN, file.access_token);
        let gps_command = pick(overrides.gps_command, ENV_GPS_COMMAND, file.gps_command);
        let db_path = pick(
            overrides.db_path.map(path_to_string),
            ENV_DB_PATH,
            file.db_path.map(path_to_string),
        )
        .map(PathBuf::from);

        let env_timeout = normalize_text_option(env(ENV_GPS_TIMEOUT_SECS))
            .map(|raw| {
                raw.parse::<u64>().map_err(|_| {
                    Error::Configuration(format!(
                        "{ENV_GPS_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                    ))
                })
            })
            .transpose()?;
        let gps_timeout = match overrides
            .gps_timeout_secs
            .or(env_timeout)
            .or(file.gps_timeout_secs)
        {
            Some(0) => {
                return Err(Error::Configuration(
                    "GPS timeout must be at least one second".into(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_GPS_TIMEOUT,
        };

        Ok(Self {
            api_base_url,
            access_token,
            db_path,
            gps_command,
            gps_timeout,
        })
    }

    /// The API base URL, or a configuration error naming how to set it.
    pub fn require_api_base_url(&self) -> Result<&str> {
        self.api_base_url.as_deref().ok_or_else(|| {
            Error::Configuration(format!(
                "No works API URL configured; pass --api-url or set {ENV_API_URL}"
            ))
        })
    }
}

fn path_to_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}
