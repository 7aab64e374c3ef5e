//! Cache command.
//!
//! ## Usage
//!
//! ```bash
//! pawnup cache path                    # print the cache directory
//! pawnup cache list                    # list cached archives
//! pawnup cache remove <filename>       # evict one archive
//! pawnup cache clean                   # delete abandoned partial downloads
//! pawnup cache add ./pawnc-3.10.10-linux.tar.gz
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use pawnup_toolchain::ArchiveFormat;

use super::GlobalArgs;
use crate::progress::format_bytes;

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheCommand {
    /// Print the cache directory.
    Path,

    /// List cached archives.
    List,

    /// Remove a cached archive.
    Remove {
        /// File name of the archive, as shown by `cache list`.
        filename: String,
    },

    /// Delete partial downloads left behind by interrupted processes.
    Clean {
        /// Only delete files at least this many hours old.
        #[clap(long, default_value_t = 24)]
        older_than_hours: u64,
    },

    /// Add a locally downloaded archive to the cache.
    Add {
        /// The archive file.
        archive: PathBuf,

        /// Cache file name. Defaults to the archive's own file name, which
        /// must match the release file name to be found by `install`.
        #[clap(long)]
        name: Option<String>,
    },
}

/// Executes the cache command.
///
/// # Errors
///
/// Returns an error if the cache cannot be located, read or modified.
pub async fn execute(args: &CacheArgs, global: &GlobalArgs) -> Result<()> {
    let settings = global.settings()?;
    let cache = global.cache(&settings)?;

    match &args.command {
        CacheCommand::Path => {
            println!("{}", cache.root().display());
        }
        CacheCommand::List => {
            let entries = cache.entries().await.context("Failed to list cache")?;
            if entries.is_empty() {
                println!("Cache is empty.");
            }
            for entry in entries {
                println!("{:<40} {:>10}", entry.filename, format_bytes(entry.size));
            }
        }
        CacheCommand::Remove { filename } => {
            if cache
                .remove(filename)
                .await
                .with_context(|| format!("Failed to remove {filename}"))?
            {
                println!("Removed {filename}.");
            } else {
                bail!("{filename} is not in the cache");
            }
        }
        CacheCommand::Clean { older_than_hours } => {
            let older_than = Duration::from_secs(older_than_hours.saturating_mul(3600));
            let removed = cache
                .clean_partials(older_than)
                .await
                .context("Failed to clean cache")?;
            println!("Removed {} partial download(s).", removed.len());
        }
        CacheCommand::Add { archive, name } => {
            let filename = match name {
                Some(name) => name.clone(),
                None => archive
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("{} has no file name", archive.display()))?,
            };
            if ArchiveFormat::from_filename(&filename).is_none() {
                eprintln!(
                    "Warning: {filename} is not a .zip or .tar.gz file name; `install` will not find it."
                );
            }
            let stored = cache
                .import(&filename, archive)
                .await
                .with_context(|| format!("Failed to add {} to the cache", archive.display()))?;
            println!(
                "Added {filename} ({}, sha256 {})",
                format_bytes(stored.size),
                stored.sha256
            );
        }
    }
    Ok(())
}
