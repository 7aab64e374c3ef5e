//! Target platforms for compiler distributions.
//!
//! ## Supported Platforms
//!
//! - macOS (`darwin`)
//! - Linux (`linux`)
//! - Windows (`windows`)
//!
//! Release archives are per operating system only, so the CPU architecture
//! plays no part in selecting a package.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

/// A platform with a published compiler distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS
    Darwin,
    /// Linux
    Linux,
    /// Windows
    Windows,
}

impl Platform {
    /// Every supported platform, in catalog order.
    pub const ALL: [Self; 3] = [Self::Darwin, Self::Linux, Self::Windows];

    /// Detects the platform of the running process.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedPlatform`] naming the host OS when it
    /// has no published distribution.
    ///
    /// # Examples
    ///
    /// ```
    /// use pawnup_toolchain::platform::Platform;
    ///
    /// if let Ok(platform) = Platform::detect() {
    ///     println!("Running on: {platform}");
    /// }
    /// ```
    pub fn detect() -> Result<Self, ConfigError> {
        #[cfg(target_os = "macos")]
        {
            return Ok(Self::Darwin);
        }

        #[cfg(target_os = "linux")]
        {
            return Ok(Self::Linux);
        }

        #[cfg(target_os = "windows")]
        {
            return Ok(Self::Windows);
        }

        #[allow(unreachable_code)]
        {
            return Err(ConfigError::UnsupportedPlatform {
                platform: std::env::consts::OS.to_string(),
            });
        }
    }

    /// Returns the identifier used in release file names and on the command line.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Returns whether this platform is Windows.
    #[must_use = "returns platform check result without side effects"]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    /// Parses an exact, lowercase platform identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnsupportedPlatform {
                platform: s.to_string(),
            })
    }
}
