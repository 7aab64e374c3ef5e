#![warn(clippy::pedantic)]
//! Acquisition of Pawn compiler distributions.
//!
//! Given a platform and a compiler version, this crate finds the release
//! archive in a static catalog, installs a fixed set of its members into a
//! directory, and keeps the archive in a local cache so later installs of the
//! same version never touch the network.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pawnup_toolchain::{Acquirer, CacheStore, HttpTransport, Settings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(None)?;
//! let acquirer = Acquirer::new(
//!     CacheStore::new(settings.cache_root()?),
//!     HttpTransport::new(&settings)?,
//! );
//! let done = acquirer
//!     .acquire("linux", "3.10.10", Path::new("toolchain"))
//!     .await?;
//! println!("installed {} files", done.installed.len());
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod archive;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod platform;
pub mod template;

#[cfg(test)]
mod test_support;

pub use acquire::{Acquirer, Acquisition, Source, package_info};
pub use archive::{ArchiveFormat, PathMapping};
pub use cache::{CacheEntry, CacheLookup, CacheStore, StoredEntry};
pub use catalog::{PackageDescriptor, ResolvedDescriptor};
pub use config::Settings;
pub use error::{
    AcquireError, CacheError, ConfigError, ExtractError, FetchError, SettingsError, Stage,
    TemplateError,
};
pub use fetch::{Download, HttpTransport, ProgressCallback, ProgressEvent, Transport};
pub use platform::Platform;
