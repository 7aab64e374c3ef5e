//! The acquisition pipeline.
//!
//! [`Acquirer::acquire`] takes a `(platform, version, destination)` request
//! through these steps, strictly in order:
//!
//! 1. Resolve the catalog descriptor for the version. Failure here happens
//!    before any filesystem or network access.
//! 2. Create the destination directory.
//! 3. Try to install from the cache. A hit finishes the request. A corrupt
//!    entry is logged and treated as a miss.
//! 4. Create the cache directory and download the archive into it.
//! 5. Install from the freshly downloaded archive.
//!
//! Nothing is retried here; a caller that wants retries re-runs the whole
//! request. Repeating a successful request is a pure cache hit.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::archive;
use crate::cache::{CacheLookup, CacheStore, StoredEntry};
use crate::catalog::{self, ResolvedDescriptor};
use crate::error::{AcquireError, CacheError, ExtractError, FetchError, Stage};
use crate::fetch::{self, HttpTransport, ProgressCallback, Transport};
use crate::platform::Platform;

/// Where the installed files came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// An existing cache entry.
    Cache,
    /// A download made by this request.
    Network,
}

/// A completed acquisition.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// The descriptor that was installed.
    pub descriptor: ResolvedDescriptor,
    /// Whether the cache satisfied the request.
    pub source: Source,
    /// Installed files, in path map order.
    pub installed: Vec<PathBuf>,
    /// The new cache entry, when the archive was downloaded.
    pub stored: Option<StoredEntry>,
    /// Whether a corrupt cache entry was replaced.
    pub replaced_corrupt: bool,
}

/// Drives acquisitions against one cache and transport.
pub struct Acquirer<T = HttpTransport> {
    cache: CacheStore,
    transport: T,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl<T> std::fmt::Debug for Acquirer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquirer")
            .field("cache", &self.cache)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Acquirer<T> {
    /// Creates an acquirer with its own, never-cancelled token.
    pub fn new(cache: CacheStore, transport: T) -> Self {
        Self {
            cache,
            transport,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Uses `cancel` to abort acquisitions.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reports download progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Installs the distribution for `platform` and `version` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquireError`] naming the failed stage. See the module
    /// docs for which failures are recovered from.
    pub async fn acquire(
        &self,
        platform: &str,
        version: &str,
        dest: &Path,
    ) -> Result<Acquisition, AcquireError> {
        let descriptor =
            catalog::resolve(platform, version).map_err(|source| AcquireError::Resolve {
                platform: platform.to_string(),
                version: version.to_string(),
                source,
            })?;
        self.install(descriptor, dest).await
    }

    /// Installs the distribution for the running platform.
    ///
    /// # Errors
    ///
    /// As [`Acquirer::acquire`]; an unsupported host OS is a
    /// [`AcquireError::Resolve`].
    pub async fn acquire_for_host(
        &self,
        version: &str,
        dest: &Path,
    ) -> Result<Acquisition, AcquireError> {
        let resolve_err = |source| AcquireError::Resolve {
            platform: std::env::consts::OS.to_string(),
            version: version.to_string(),
            source,
        };
        let platform = Platform::detect().map_err(resolve_err)?;
        let descriptor = catalog::descriptor(platform)
            .resolve(version)
            .map_err(resolve_err)?;
        self.install(descriptor, dest).await
    }

    /// Installs an already resolved descriptor into `dest`.
    ///
    /// # Errors
    ///
    /// As [`Acquirer::acquire`], minus resolution failures.
    pub async fn install(
        &self,
        descriptor: ResolvedDescriptor,
        dest: &Path,
    ) -> Result<Acquisition, AcquireError> {
        let filename = descriptor.filename.as_str();
        let platform = descriptor.platform.as_str();
        let version = descriptor.version.as_str();

        if self.cancel.is_cancelled() {
            return Err(AcquireError::Cancelled {
                stage: Stage::Cache,
            });
        }

        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| AcquireError::InstallDir {
                path: dest.to_path_buf(),
                source,
            })?;

        let cache_err = |source: CacheError| match source {
            CacheError::Cancelled => AcquireError::Cancelled {
                stage: Stage::Cache,
            },
            source => AcquireError::Cache {
                filename: filename.to_string(),
                source,
            },
        };

        let lookup = self
            .cache
            .satisfy(
                filename,
                dest,
                descriptor.format,
                &descriptor.path_map,
                &self.cancel,
            )
            .await
            .map_err(cache_err)?;

        let corrupt = match lookup {
            CacheLookup::Hit(installed) => {
                tracing::info!(platform, version, filename, "installed from cache");
                return Ok(Acquisition {
                    descriptor,
                    source: Source::Cache,
                    installed,
                    stored: None,
                    replaced_corrupt: false,
                });
            }
            CacheLookup::Miss => None,
            CacheLookup::Corrupt(err) => {
                tracing::warn!(
                    platform,
                    version,
                    filename,
                    member = err.member().unwrap_or_default(),
                    error = %err,
                    "cached archive is unusable, downloading it again"
                );
                Some(err)
            }
        };

        self.cache.ensure_root().await.map_err(cache_err)?;
        let replaced_corrupt = corrupt.is_some();

        let stored = fetch::fetch(
            &self.transport,
            &descriptor.locator,
            &self.cache,
            filename,
            &self.cancel,
            self.progress.as_ref(),
        )
        .await
        .map_err(|source| network_error(&descriptor, corrupt, source))?;

        let installed = archive::extract_blocking(
            descriptor.format,
            stored.path.clone(),
            dest.to_path_buf(),
            descriptor.path_map.clone(),
            self.cancel.clone(),
        )
        .await
        .map_err(|source| match source {
            ExtractError::Cancelled => AcquireError::Cancelled {
                stage: Stage::Extract,
            },
            source => AcquireError::Extract {
                archive: stored.path.clone(),
                destination: dest.to_path_buf(),
                source,
            },
        })?;

        tracing::info!(platform, version, filename, "installed from download");
        Ok(Acquisition {
            descriptor,
            source: Source::Network,
            installed,
            stored: Some(stored),
            replaced_corrupt,
        })
    }
}

/// Resolves `platform` and `version` without touching the filesystem or network.
///
/// # Errors
///
/// Returns [`AcquireError::Resolve`] for an unsupported platform or an
/// unusable version.
pub fn package_info(platform: &str, version: &str) -> Result<ResolvedDescriptor, AcquireError> {
    catalog::resolve(platform, version).map_err(|source| AcquireError::Resolve {
        platform: platform.to_string(),
        version: version.to_string(),
        source,
    })
}

fn network_error(
    descriptor: &ResolvedDescriptor,
    corrupt_cache: Option<ExtractError>,
    source: FetchError,
) -> AcquireError {
    match source {
        FetchError::Cancelled { .. } => AcquireError::Cancelled {
            stage: Stage::Network,
        },
        source => AcquireError::Network {
            url: descriptor.locator.to_string(),
            corrupt_cache,
            source,
        },
    }
}
