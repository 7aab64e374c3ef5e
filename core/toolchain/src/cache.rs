//! The download cache.
//!
//! Entries are release archives stored flat under the cache root, keyed by
//! the file name of their download URL. An entry only ever appears under its
//! final name by an atomic rename of a fully written temporary file, so a
//! reader sees a complete archive or nothing. Temporary files are hidden
//! (`.<filename>.<random>.part`) and are removed when the write is abandoned.
//!
//! Several processes may share one cache. Two of them storing the same entry
//! at once both succeed and the last rename wins; since both wrote the same
//! bytes this is harmless.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::archive::{self, ArchiveFormat, PathMapping};
use crate::error::{CacheError, ExtractError};

/// Suffix of in-progress downloads.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Read buffer size when copying into the cache.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of trying to install from the cache.
#[derive(Debug)]
pub enum CacheLookup {
    /// No entry under that name.
    Miss,
    /// The entry was extracted; holds the installed paths.
    Hit(Vec<PathBuf>),
    /// The entry exists but is not a usable archive.
    Corrupt(ExtractError),
}

/// A complete entry that was just written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Final path of the entry.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Lowercase hex SHA-256 of the contents.
    pub sha256: String,
}

/// A complete entry found by [`CacheStore::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cache key.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<SystemTime>,
}

/// A cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the final path for `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidFilename`] unless `filename` is a single
    /// path segment that does not start with a dot.
    pub fn entry_path(&self, filename: &str) -> Result<PathBuf, CacheError> {
        let valid = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\', ':'])
            && !filename.chars().any(char::is_control);
        if valid {
            Ok(self.root.join(filename))
        } else {
            Err(CacheError::InvalidFilename {
                filename: filename.to_string(),
            })
        }
    }

    /// Returns whether a complete entry named `filename` exists.
    ///
    /// Only checks presence; the entry may still turn out to be corrupt.
    #[must_use]
    pub fn has(&self, filename: &str) -> bool {
        self.entry_path(filename).is_ok_and(|path| path.is_file())
    }

    /// Installs `path_map` from the cached `filename` into `dest`, if present.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidFilename`] for an unusable key.
    /// - [`CacheError::Io`] if the entry exists but cannot be inspected or
    ///   opened (for example, permission denied).
    /// - [`CacheError::Install`] if the archive is fine but writing into
    ///   `dest` fails.
    /// - [`CacheError::Cancelled`] if `cancel` fires during extraction.
    ///
    /// A present entry that fails to decode or lacks a mapped member is not an
    /// error; it is reported as [`CacheLookup::Corrupt`].
    pub async fn satisfy(
        &self,
        filename: &str,
        dest: &Path,
        format: ArchiveFormat,
        path_map: &[PathMapping],
        cancel: &CancellationToken,
    ) -> Result<CacheLookup, CacheError> {
        let path = self.entry_path(filename)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(CacheError::io(
                    &path,
                    std::io::Error::other("cache entry is not a regular file"),
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(filename, "cache miss");
                return Ok(CacheLookup::Miss);
            }
            Err(e) => return Err(CacheError::io(&path, e)),
        }

        let result = archive::extract_blocking(
            format,
            path.clone(),
            dest.to_path_buf(),
            path_map.to_vec(),
            cancel.clone(),
        )
        .await;

        match result {
            Ok(installed) => {
                tracing::debug!(filename, "cache hit");
                Ok(CacheLookup::Hit(installed))
            }
            Err(ExtractError::Cancelled) => Err(CacheError::Cancelled),
            Err(e) if e.is_archive_fault() => Ok(CacheLookup::Corrupt(e)),
            Err(ExtractError::OpenArchive { source, .. }) => Err(CacheError::io(&path, source)),
            Err(e) => Err(CacheError::Install {
                archive: path,
                source: e,
            }),
        }
    }

    /// Creates the cache root if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CacheError::io(&self.root, e))
    }

    /// Starts writing a new entry named `filename`.
    ///
    /// Nothing is visible under `filename` until [`PendingEntry::commit`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidFilename`] for an unusable key and
    /// [`CacheError::Io`] if the temporary file cannot be created.
    pub async fn begin(&self, filename: &str) -> Result<PendingEntry, CacheError> {
        let target = self.entry_path(filename)?;
        self.ensure_root().await?;

        let named = tempfile::Builder::new()
            .prefix(&format!(".{filename}."))
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(|e| CacheError::io(&self.root, e))?;
        let (file, temp) = named.into_parts();

        tracing::debug!(filename, temp = %temp.display(), "writing cache entry");
        Ok(PendingEntry {
            file: tokio::fs::File::from_std(file),
            temp,
            target,
            hasher: Sha256::new(),
            size: 0,
        })
    }

    /// Copies `reader` into a new entry named `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] on read or write failure and
    /// [`CacheError::Cancelled`] if `cancel` fires. No entry is left behind in
    /// either case.
    pub async fn store<R>(
        &self,
        filename: &str,
        mut reader: R,
        cancel: &CancellationToken,
    ) -> Result<StoredEntry, CacheError>
    where
        R: AsyncRead + Unpin,
    {
        let mut pending = self.begin(filename).await?;
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        loop {
            let n = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(CacheError::Cancelled),
                read = reader.read(&mut buffer) => read.map_err(|e| CacheError::io(&pending.target, e))?,
            };
            if n == 0 {
                break;
            }
            pending.write_chunk(&buffer[..n]).await?;
        }
        pending.commit().await
    }

    /// Copies a local archive into the cache under `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if `source` cannot be read or the entry
    /// cannot be written.
    pub async fn import(&self, filename: &str, source: &Path) -> Result<StoredEntry, CacheError> {
        let file = tokio::fs::File::open(source)
            .await
            .map_err(|e| CacheError::io(source, e))?;
        self.store(filename, file, &CancellationToken::new()).await
    }

    /// Lists complete entries, sorted by file name.
    ///
    /// A missing cache root is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the root cannot be read.
    pub async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut entries = Vec::new();
        let Some(mut dir) = self.read_root().await? else {
            return Ok(entries);
        };

        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let Ok(filename) = item.file_name().into_string() else {
                continue;
            };
            if filename.starts_with('.') {
                continue;
            }
            let meta = item
                .metadata()
                .await
                .map_err(|e| CacheError::io(item.path(), e))?;
            if !meta.is_file() {
                continue;
            }
            entries.push(CacheEntry {
                filename,
                size: meta.len(),
                modified: meta.modified().ok(),
            });
        }

        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(entries)
    }

    /// Removes the entry named `filename`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidFilename`] for an unusable key and
    /// [`CacheError::Io`] if removal fails.
    pub async fn remove(&self, filename: &str) -> Result<bool, CacheError> {
        let path = self.entry_path(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename, "removed cache entry");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Deletes temporary download files last modified at least `older_than` ago.
    ///
    /// These are left behind only when a process dies mid-download. Recent
    /// ones may belong to a download still in progress elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the root cannot be read or a file cannot
    /// be removed.
    pub async fn clean_partials(&self, older_than: Duration) -> Result<Vec<PathBuf>, CacheError> {
        let mut removed = Vec::new();
        let Some(mut dir) = self.read_root().await? else {
            return Ok(removed);
        };
        let now = SystemTime::now();

        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let name = item.file_name();
            let name = name.to_string_lossy();
            if !(name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)) {
                continue;
            }
            let path = item.path();
            let meta = item
                .metadata()
                .await
                .map_err(|e| CacheError::io(&path, e))?;
            let age = meta
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            if !meta.is_file() || age < older_than {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CacheError::io(&path, e)),
            }
            tracing::info!(path = %path.display(), "removed stale partial download");
            removed.push(path);
        }

        Ok(removed)
    }

    async fn read_root(&self) -> Result<Option<tokio::fs::ReadDir>, CacheError> {
        match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => Ok(Some(dir)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(&self.root, e)),
        }
    }
}

/// An entry being written.
///
/// Dropping it without calling [`commit`](Self::commit) deletes the
/// temporary file.
pub struct PendingEntry {
    // Declared before `temp` so the handle is closed before the file is removed.
    file: tokio::fs::File,
    temp: TempPath,
    target: PathBuf,
    hasher: Sha256,
    size: u64,
}

impl std::fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEntry")
            .field("temp", &self.temp)
            .field("target", &self.target)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl PendingEntry {
    /// Appends `chunk` to the entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the write fails.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CacheError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| CacheError::io(&*self.temp, e))?;
        self.hasher.update(chunk);
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Flushes the entry to disk and renames it into place.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if syncing or renaming fails; the temporary
    /// file is removed in that case.
    pub async fn commit(self) -> Result<StoredEntry, CacheError> {
        let Self {
            mut file,
            temp,
            target,
            hasher,
            size,
        } = self;

        file.flush()
            .await
            .map_err(|e| CacheError::io(&*temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| CacheError::io(&*temp, e))?;
        drop(file);

        temp.persist(&target)
            .map_err(|e| CacheError::io(&target, e.error))?;

        let sha256 = hex::encode(hasher.finalize());
        tracing::info!(path = %target.display(), size, sha256 = %sha256, "stored cache entry");
        Ok(StoredEntry {
            path: target,
            size,
            sha256,
        })
    }
}
