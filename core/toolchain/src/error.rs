//! Error types for toolchain acquisition.
//!
//! Each pipeline component owns one error enum. Lower layers are wrapped at
//! every boundary together with the concrete filename, URL, platform or archive
//! member involved, so the final [`AcquireError`] names the whole causal chain
//! when printed with its sources.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used where the underlying cause comes from a pluggable component.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A malformed version template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `{` without a matching `}` or a `}` without an opening `{`.
    #[error("unbalanced brace at byte {offset} in template `{template}`")]
    Unbalanced {
        /// The template text.
        template: String,
        /// Byte offset of the offending brace.
        offset: usize,
    },

    /// A placeholder other than `{version}`.
    #[error("unknown placeholder `{{{name}}}` in template `{template}`")]
    UnknownPlaceholder {
        /// The template text.
        template: String,
        /// The placeholder name between the braces.
        name: String,
    },
}

/// Configuration errors: a defect in the static catalog or in caller input.
///
/// These are raised before any filesystem or network activity and are never
/// worth retrying.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform identifier is not in the catalog.
    #[error("unsupported platform `{platform}` (supported: darwin, linux, windows)")]
    UnsupportedPlatform {
        /// The identifier that was requested.
        platform: String,
    },

    /// A descriptor template is malformed.
    #[error("malformed package descriptor template")]
    Template(#[from] TemplateError),

    /// The version string cannot be substituted safely.
    #[error("invalid version `{version}`: {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The resolved locator is not a valid URL.
    #[error("invalid download locator `{locator}`")]
    InvalidLocator {
        /// The resolved locator text.
        locator: String,
        /// The URL parser's complaint.
        #[source]
        source: url::ParseError,
    },

    /// The resolved locator has no path basename to use as the cache key.
    #[error("download locator `{locator}` has no file name")]
    MissingFilename {
        /// The resolved locator text.
        locator: String,
    },

    /// The resolved locator carries a query or fragment, so its last path
    /// segment is not the artifact.
    #[error("download locator `{locator}` has a {part}")]
    LocatorNotAPath {
        /// The resolved locator text.
        locator: String,
        /// Either `query` or `fragment`.
        part: &'static str,
    },

    /// A resolved archive member or install path is not a safe relative path.
    #[error("invalid {role} path `{path}`: {reason}")]
    InvalidPath {
        /// Either `archive member` or `install`.
        role: &'static str,
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two path map entries name the same archive member.
    #[error("archive member `{member}` is mapped more than once")]
    DuplicateMember {
        /// The repeated member.
        member: String,
    },

    /// Two path map entries install to the same destination.
    #[error("install path `{path}` is the destination of more than one member")]
    DuplicateDestination {
        /// The repeated destination.
        path: String,
    },
}

/// Failure while materializing archive members.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The archive file could not be opened.
    #[error("failed to open archive {}", archive.display())]
    OpenArchive {
        /// Path of the archive.
        archive: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be decoded (truncated, wrong format, bad checksum).
    #[error("malformed archive {}", archive.display())]
    MalformedArchive {
        /// Path of the archive.
        archive: PathBuf,
        /// The decoder's error.
        #[source]
        source: BoxError,
    },

    /// A mapped member does not exist in the archive.
    #[error("archive {} has no member `{member}`", archive.display())]
    MissingMember {
        /// Path of the archive.
        archive: PathBuf,
        /// The member that was looked up.
        member: String,
    },

    /// A mapped member exists but is a directory, link or other non-file entry.
    #[error("archive member `{member}` is not a regular file")]
    NotAFile {
        /// The offending member.
        member: String,
    },

    /// Decompressing a member's contents failed.
    #[error("failed to read archive member `{member}`")]
    ReadMember {
        /// The member being read.
        member: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a member to its install path failed.
    #[error("failed to write archive member `{member}` to {}", destination.display())]
    WriteDestination {
        /// The member being written.
        member: String,
        /// The install path.
        destination: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The caller's cancellation token fired between members.
    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractError {
    /// Returns whether the failure is a property of the archive contents.
    ///
    /// A cached file that fails this way is corrupt and must be replaced. I/O
    /// failures on the destination side and cancellation are not archive faults.
    #[must_use]
    pub fn is_archive_fault(&self) -> bool {
        matches!(
            self,
            Self::MalformedArchive { .. }
                | Self::MissingMember { .. }
                | Self::NotAFile { .. }
                | Self::ReadMember { .. }
        )
    }

    /// Returns the archive member the error concerns, if any.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        match self {
            Self::MissingMember { member, .. }
            | Self::NotAFile { member }
            | Self::ReadMember { member, .. }
            | Self::WriteDestination { member, .. } => Some(member),
            Self::OpenArchive { .. } | Self::MalformedArchive { .. } | Self::Cancelled => None,
        }
    }
}

/// Cache store failure (other than a corrupt entry, which is a lookup outcome).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache key is not a single safe file name.
    #[error("invalid cache file name `{filename}`")]
    InvalidFilename {
        /// The rejected key.
        filename: String,
    },

    /// Filesystem access inside the cache directory failed.
    #[error("cache I/O failed at {}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A cached archive was readable but installing its members failed on the
    /// destination side.
    #[error("failed to install from cached archive {}", archive.display())]
    Install {
        /// The cached archive.
        archive: PathBuf,
        /// The extraction failure.
        #[source]
        source: ExtractError,
    },

    /// The caller's cancellation token fired.
    #[error("cache operation cancelled")]
    Cancelled,
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Network retrieval failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed")]
    Transport {
        /// The requested URL.
        url: String,
        /// The transport's error.
        #[source]
        source: BoxError,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The status code received.
        status: u16,
    },

    /// The response body broke off mid-stream.
    #[error("download stream from {url} broke after {received} bytes")]
    Stream {
        /// The requested URL.
        url: String,
        /// Bytes received before the failure.
        received: u64,
        /// The transport's error.
        #[source]
        source: BoxError,
    },

    /// Writing the body into the cache failed.
    #[error("failed to store download from {url} in the cache")]
    Store {
        /// The requested URL.
        url: String,
        /// The cache failure.
        #[source]
        source: CacheError,
    },

    /// The caller's cancellation token fired.
    #[error("download of {url} cancelled")]
    Cancelled {
        /// The requested URL.
        url: String,
    },
}

/// Pipeline stage an acquisition failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Platform lookup and template resolution.
    Resolve,
    /// Cache lookup or cache directory preparation.
    Cache,
    /// Network download.
    Network,
    /// Installing archive members into the destination.
    Extract,
}

impl Stage {
    /// Returns the lowercase stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "descriptor resolution",
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Extract => "extraction",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one acquisition request.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The descriptor could not be resolved. No I/O was performed.
    #[error("cannot resolve package for platform `{platform}` version `{version}`")]
    Resolve {
        /// The requested platform identifier.
        platform: String,
        /// The requested version.
        version: String,
        /// The configuration error.
        #[source]
        source: ConfigError,
    },

    /// The install directory could not be created.
    #[error("failed to create install directory {}", path.display())]
    InstallDir {
        /// The install directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cache could not be read or prepared.
    #[error("cache access for `{filename}` failed")]
    Cache {
        /// The cache key.
        filename: String,
        /// The cache failure.
        #[source]
        source: CacheError,
    },

    /// Downloading the artifact failed.
    #[error("failed to download {url}{}", corrupt_cache_note(.corrupt_cache.as_ref()))]
    Network {
        /// The artifact URL.
        url: String,
        /// Why the cached copy was rejected, when a corrupt entry caused the fetch.
        corrupt_cache: Option<ExtractError>,
        /// The fetch failure.
        #[source]
        source: FetchError,
    },

    /// Installing members from a freshly downloaded archive failed.
    #[error("failed to extract {} into {}", archive.display(), destination.display())]
    Extract {
        /// The downloaded archive.
        archive: PathBuf,
        /// The install directory.
        destination: PathBuf,
        /// The extraction failure, naming the member.
        #[source]
        source: ExtractError,
    },

    /// The caller's cancellation token fired.
    #[error("acquisition cancelled during {stage}")]
    Cancelled {
        /// The stage that observed the cancellation.
        stage: Stage,
    },
}

impl AcquireError {
    /// Returns the stage the acquisition failed in.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Resolve { .. } => Stage::Resolve,
            Self::Cache { .. } => Stage::Cache,
            Self::Network { .. } => Stage::Network,
            Self::InstallDir { .. } | Self::Extract { .. } => Stage::Extract,
            Self::Cancelled { stage } => *stage,
        }
    }

    /// Returns whether the acquisition stopped because it was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns whether re-running the same request might succeed.
    ///
    /// Only network failures qualify, and of HTTP errors only server errors
    /// and rate limiting; a 404 will not go away on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source, .. } => match source {
                FetchError::Transport { .. } | FetchError::Stream { .. } => true,
                FetchError::Status { status, .. } => *status >= 500 || *status == 429,
                FetchError::Client(_) | FetchError::Store { .. } | FetchError::Cancelled { .. } => {
                    false
                }
            },
            _ => false,
        }
    }
}

fn corrupt_cache_note(corrupt: Option<&ExtractError>) -> String {
    match corrupt {
        Some(err) => format!(" (cached copy was unusable: {err})"),
        None => String::new(),
    }
}

/// Failure loading [`crate::config::Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The config file could not be read.
    #[error("failed to read config file {}", path.display())]
    ReadConfig {
        /// The config file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::config::Settings`].
    #[error("failed to parse config file {}", path.display())]
    ParseConfig {
        /// The config file.
        path: PathBuf,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// No cache directory is configured and the OS provides none.
    #[error("cannot determine a cache directory; set PAWNUP_CACHE_DIR")]
    NoCacheDir,
}
