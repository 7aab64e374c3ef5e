//! The platform catalog: where each platform's compiler distribution lives
//! and which of its members get installed.
//!
//! The table is a `static` and is never mutated, so lookups need no
//! synchronization. Descriptors hold templates; [`PackageDescriptor::resolve`]
//! turns one into a [`ResolvedDescriptor`] for a concrete version, validating
//! every resolved URL and path up front so that no I/O ever starts from a
//! half-resolved descriptor.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::archive::{ArchiveFormat, PathMapping};
use crate::error::ConfigError;
use crate::platform::Platform;
use crate::template::Template;

/// Builds a locator template under the upstream release download prefix.
macro_rules! release {
    ($file:literal) => {
        concat!(
            "https://github.com/Zeex/pawn/releases/download/v{version}/",
            $file
        )
    };
}

/// How to locate and install one platform's distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// The platform this descriptor serves.
    pub platform: Platform,
    /// URL template for the release archive.
    pub locator: &'static str,
    /// Container format of the release archive.
    pub format: ArchiveFormat,
    /// Ordered `(archive member template, install path template)` pairs.
    pub path_map: &'static [(&'static str, &'static str)],
}

static DARWIN: PackageDescriptor = PackageDescriptor {
    platform: Platform::Darwin,
    locator: release!("pawnc-{version}-darwin.zip"),
    format: ArchiveFormat::Zip,
    path_map: &[
        ("pawnc-{version}-darwin/bin/pawncc", "pawncc"),
        ("pawnc-{version}-darwin/lib/libpawnc.dylib", "libpawnc.dylib"),
    ],
};

static LINUX: PackageDescriptor = PackageDescriptor {
    platform: Platform::Linux,
    locator: release!("pawnc-{version}-linux.tar.gz"),
    format: ArchiveFormat::TarGzip,
    path_map: &[
        ("pawnc-{version}-linux/bin/pawncc", "pawncc"),
        ("pawnc-{version}-linux/lib/libpawnc.so", "libpawnc.so"),
    ],
};

static WINDOWS: PackageDescriptor = PackageDescriptor {
    platform: Platform::Windows,
    locator: release!("pawnc-{version}-windows.zip"),
    format: ArchiveFormat::Zip,
    path_map: &[
        ("pawnc-{version}-windows/bin/pawncc.exe", "pawncc.exe"),
        ("pawnc-{version}-windows/bin/pawnc.dll", "pawnc.dll"),
    ],
};

/// Returns the descriptor for `platform`.
#[must_use]
pub fn descriptor(platform: Platform) -> &'static PackageDescriptor {
    match platform {
        Platform::Darwin => &DARWIN,
        Platform::Linux => &LINUX,
        Platform::Windows => &WINDOWS,
    }
}

/// Looks up the descriptor for a platform identifier.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedPlatform`] for anything other than
/// `darwin`, `linux` or `windows`.
pub fn lookup(platform: &str) -> Result<&'static PackageDescriptor, ConfigError> {
    platform.parse().map(descriptor)
}

/// Every catalog entry, in [`Platform::ALL`] order.
pub fn descriptors() -> impl Iterator<Item = &'static PackageDescriptor> {
    Platform::ALL.into_iter().map(descriptor)
}

/// Looks up `platform` and resolves its descriptor for `version`.
///
/// # Errors
///
/// Any [`ConfigError`] from [`lookup`] or [`PackageDescriptor::resolve`].
pub fn resolve(platform: &str, version: &str) -> Result<ResolvedDescriptor, ConfigError> {
    lookup(platform)?.resolve(version)
}

/// A descriptor instantiated for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDescriptor {
    /// Target platform.
    pub platform: Platform,
    /// The version that was substituted.
    pub version: String,
    /// Download URL of the release archive.
    pub locator: Url,
    /// Last path segment of `locator`; the cache key.
    pub filename: String,
    /// Container format of the archive.
    pub format: ArchiveFormat,
    /// Members to install and where.
    pub path_map: Vec<PathMapping>,
}

impl PackageDescriptor {
    /// Substitutes `version` into the locator and every path map entry.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidVersion`] if `version` is empty, contains `..`
    ///   or has a character outside ASCII letters, digits, `.`, `-`, `_`, `+`
    ///   and `~`.
    /// - [`ConfigError::Template`] if any template is malformed.
    /// - [`ConfigError::InvalidLocator`], [`ConfigError::LocatorNotAPath`] or
    ///   [`ConfigError::MissingFilename`] if the locator does not resolve to a
    ///   plain URL ending in a file name.
    /// - [`ConfigError::InvalidPath`] if a member or install path is not a safe
    ///   relative path.
    /// - [`ConfigError::DuplicateMember`] or [`ConfigError::DuplicateDestination`]
    ///   if two entries collide after substitution.
    pub fn resolve(&self, version: &str) -> Result<ResolvedDescriptor, ConfigError> {
        validate_version(version)?;

        let locator_text = Template::parse(self.locator)?.render(version);
        let locator =
            Url::parse(&locator_text).map_err(|source| ConfigError::InvalidLocator {
                locator: locator_text.clone(),
                source,
            })?;
        let extra_part = if locator.query().is_some() {
            Some("query")
        } else if locator.fragment().is_some() {
            Some("fragment")
        } else {
            None
        };
        if let Some(part) = extra_part {
            return Err(ConfigError::LocatorNotAPath {
                locator: locator_text,
                part,
            });
        }
        let filename = locator
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingFilename {
                locator: locator_text.clone(),
            })?;

        let mut members = HashSet::new();
        let mut installs = HashSet::new();
        let mut path_map = Vec::with_capacity(self.path_map.len());
        for (member_template, install_template) in self.path_map {
            let member = Template::parse(member_template)?.render(version);
            let member = normalize(&member, "archive member")?.join("/");
            let install = Template::parse(install_template)?.render(version);
            let install: PathBuf = normalize(&install, "install")?.into_iter().collect();

            if !members.insert(member.clone()) {
                return Err(ConfigError::DuplicateMember { member });
            }
            if !installs.insert(install.clone()) {
                return Err(ConfigError::DuplicateDestination {
                    path: install.display().to_string(),
                });
            }
            path_map.push(PathMapping { member, install });
        }

        Ok(ResolvedDescriptor {
            platform: self.platform,
            version: version.to_string(),
            locator,
            filename,
            format: self.format,
            path_map,
        })
    }
}

fn validate_version(version: &str) -> Result<(), ConfigError> {
    let reason = if version.is_empty() {
        Some("version is empty")
    } else if version.contains(['/', '\\']) {
        Some("contains a path separator")
    } else if version.contains(['{', '}']) {
        Some("contains a brace")
    } else if version.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("contains whitespace or control characters")
    } else if version.contains("..") {
        Some("contains `..`")
    } else if !version.chars().all(is_version_char) {
        Some("contains a character that is not allowed in a URL path segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidVersion {
            version: version.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Unreserved URL characters, plus `+` for build metadata.
fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '~' | '+')
}

/// Splits a resolved path into its segments, rejecting anything that is not
/// a plain relative path. `.` and empty segments are dropped.
fn normalize<'a>(path: &'a str, role: &'static str) -> Result<Vec<&'a str>, ConfigError> {
    let invalid = |reason| ConfigError::InvalidPath {
        role,
        path: path.to_string(),
        reason,
    };

    if path.starts_with(['/', '\\']) || path.as_bytes().get(1) == Some(&b':') {
        return Err(invalid("must be relative"));
    }

    let mut segments = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid("contains `..`")),
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments)
}
