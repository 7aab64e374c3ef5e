#![warn(clippy::pedantic)]

//! # pawnup
//!
//! Installs Pawn compiler distributions.
//!
//! ## Subcommands
//!
//! - `install` - Install a compiler version into a directory
//! - `info` - Show where a version is downloaded from and what gets installed
//! - `platforms` - List supported platforms
//! - `cache` - Inspect and maintain the download cache
//!
//! ## Examples
//!
//! Install into `./pawn`:
//! ```bash
//! pawnup install 3.10.10 pawn
//! ```
//!
//! Install the Windows compiler from a Linux machine:
//! ```bash
//! pawnup install 3.10.10 pawn-win --platform windows
//! ```

mod commands;
mod progress;
mod retry;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{GlobalArgs, cache, info, install, platforms};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "PAWNUP_LOG";

/// Pawn compiler installer.
#[derive(Parser)]
#[command(
    name = "pawnup",
    author,
    version,
    about = "Install Pawn compiler distributions",
    after_help = "\
ENVIRONMENT VARIABLES:
    PAWNUP_CACHE_DIR        Download cache directory
    PAWNUP_CONFIG           Config file (default: <config dir>/pawnup/config.toml)
    PAWNUP_LOG              Log filter, e.g. \"pawnup_toolchain=debug\""
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Install a compiler version.
    ///
    /// Uses the cached release archive when there is one, downloading it
    /// otherwise, and installs the compiler and its shared library into the
    /// target directory.
    Install(install::InstallArgs),

    /// Show the download URL and install layout of a version.
    ///
    /// Performs no downloads.
    Info(info::InfoArgs),

    /// List supported platforms.
    Platforms,

    /// Manage the download cache.
    Cache(cache::CacheArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Install(args) => install::execute(&args, &cli.global).await,
        Commands::Info(args) => info::execute(&args, &cli.global),
        Commands::Platforms => platforms::execute(),
        Commands::Cache(args) => cache::execute(&args, &cli.global).await,
    }
}

/// Logs to stderr. `PAWNUP_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
