//! Subcommand implementations.

pub mod cache;
pub mod info;
pub mod install;
pub mod platforms;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pawnup_toolchain::{CacheStore, Settings};

/// Options shared by every subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Download cache directory.
    ///
    /// Overrides PAWNUP_CACHE_DIR and the config file.
    #[clap(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Config file to read instead of the default one.
    #[clap(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Download timeout in seconds.
    #[clap(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log more (-v info, -vv debug, -vvv trace).
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Loads settings and applies command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings =
            Settings::load(self.config.as_deref()).context("Failed to load settings")?;
        if let Some(dir) = &self.cache_dir {
            settings.cache_dir = Some(dir.clone());
        }
        if let Some(secs) = self.timeout {
            settings.request_timeout_secs = secs;
        }
        Ok(settings)
    }

    /// Opens the configured cache.
    pub fn cache(&self, settings: &Settings) -> Result<CacheStore> {
        let root = settings
            .cache_root()
            .context("Failed to determine the cache directory")?;
        tracing::debug!(root = %root.display(), "using cache");
        Ok(CacheStore::new(root))
    }
}
