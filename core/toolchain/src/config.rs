//! Settings for acquisition.
//!
//! Settings come from an optional TOML file and the environment:
//!
//! ```toml
//! cache_dir = "/var/cache/pawnup"
//! request_timeout_secs = 300
//! connect_timeout_secs = 30
//! user_agent = "pawnup/0.1.0"
//! ```
//!
//! The file is `$PAWNUP_CONFIG` if set, else `<config dir>/pawnup/config.toml`.
//! A missing default file is fine; a missing file that was asked for is not.
//! `$PAWNUP_CACHE_DIR` overrides `cache_dir`. Callers apply their own
//! overrides (command-line flags) on top of the loaded value.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Environment variable to override the cache directory.
pub const CACHE_DIR_ENV: &str = "PAWNUP_CACHE_DIR";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PAWNUP_CONFIG";

/// Directory name used under the OS cache and config directories.
const APP_DIR: &str = "pawnup";

/// Config file name under the OS config directory.
const CONFIG_FILE: &str = "config.toml";

/// User agent sent with downloads.
pub const USER_AGENT: &str = concat!("pawnup/", env!("CARGO_PKG_VERSION"));

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Acquisition settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Cache root. Defaults to `<OS cache dir>/pawnup`.
    pub cache_dir: Option<PathBuf>,
    /// Timeout for a whole download request.
    pub request_timeout_secs: u64,
    /// Timeout for establishing a connection.
    pub connect_timeout_secs: u64,
    /// HTTP `User-Agent`.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `explicit`, `$PAWNUP_CONFIG` or the default config
    /// file, then applies `$PAWNUP_CACHE_DIR`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ReadConfig`] if a named config file cannot be
    /// read and [`SettingsError::ParseConfig`] if any config file is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(explicit, |key| std::env::var_os(key))
    }

    fn load_with_env(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<OsString>,
    ) -> Result<Self, SettingsError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from));

        let mut settings = match named {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Some(dir) = env(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            settings.cache_dir = Some(PathBuf::from(dir));
        }
        Ok(settings)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ReadConfig`] or [`SettingsError::ParseConfig`].
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&text).map_err(|source| SettingsError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(settings)
    }

    /// Returns the cache root to use.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoCacheDir`] if no directory is configured and
    /// the OS does not report a user cache directory.
    pub fn cache_root(&self) -> Result<PathBuf, SettingsError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(SettingsError::NoCacheDir),
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Returns `<OS config dir>/pawnup/config.toml`, if the OS has a config dir.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
