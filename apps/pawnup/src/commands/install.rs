//! Install command.
//!
//! ## Usage
//!
//! ```bash
//! pawnup install 3.10.10                       # into the current directory
//! pawnup install 3.10.10 tools/pawn            # into tools/pawn
//! pawnup install 3.10.10 out --platform linux  # a specific platform
//! ```
//!
//! Ctrl-C stops the install. A download interrupted that way leaves nothing
//! in the cache.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use pawnup_toolchain::{Acquirer, Acquisition, HttpTransport, Platform, Source};
use tokio_util::sync::CancellationToken;

use super::GlobalArgs;
use crate::progress::{format_bytes, stderr_progress};
use crate::retry::calculate_retry_delay;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Compiler version to install (e.g., "3.10.10").
    pub version: String,

    /// Directory to install into. Created if missing.
    #[clap(default_value = ".")]
    pub dir: PathBuf,

    /// Target platform: darwin, linux or windows.
    ///
    /// Defaults to the platform pawnup is running on.
    #[clap(long)]
    pub platform: Option<String>,

    /// How many times to retry a download that failed for a transient reason.
    #[clap(long, default_value_t = 2)]
    pub retries: u32,

    /// Do not show download progress.
    #[clap(short, long)]
    pub quiet: bool,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, the platform or version is
/// unusable, or the acquisition fails after all retries.
pub async fn execute(args: &InstallArgs, global: &GlobalArgs) -> Result<()> {
    let settings = global.settings()?;
    let cache = global.cache(&settings)?;
    let transport = HttpTransport::new(&settings).context("Failed to create HTTP client")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mut acquirer = Acquirer::new(cache, transport).with_cancellation(cancel.clone());
    if !args.quiet {
        acquirer = acquirer.with_progress(stderr_progress());
    }

    let target = target_label(args.platform.as_deref());
    println!(
        "Installing Pawn compiler {} for {target} into {}...",
        args.version,
        args.dir.display()
    );

    let mut attempt = 0;
    let acquisition = loop {
        let result = match &args.platform {
            Some(platform) => acquirer.acquire(platform, &args.version, &args.dir).await,
            None => acquirer.acquire_for_host(&args.version, &args.dir).await,
        };

        match result {
            Ok(acquisition) => break acquisition,
            Err(e) if e.is_retryable() && attempt < args.retries => {
                attempt += 1;
                let delay = calculate_retry_delay(attempt);
                eprintln!(
                    "{e}. Retrying in {:.1}s (attempt {}/{})...",
                    delay.as_secs_f64(),
                    attempt + 1,
                    args.retries + 1
                );
                tokio::select! {
                    () = cancel.cancelled() => bail!("Install of Pawn compiler {} cancelled", args.version),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to install Pawn compiler {}", args.version)
                });
            }
        }
    };

    report(&acquisition);
    Ok(())
}

/// The platform name shown to the user: the requested one, or the host's
/// catalog id.
fn target_label(platform: Option<&str>) -> String {
    match platform {
        Some(platform) => platform.to_string(),
        None => Platform::detect().map_or_else(
            |_| std::env::consts::OS.to_string(),
            |platform| platform.to_string(),
        ),
    }
}

/// Cancels `cancel` on the first Ctrl-C.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("Interrupted, cancelling...");
            cancel.cancel();
        }
    });
}

fn report(acquisition: &Acquisition) {
    match (&acquisition.source, &acquisition.stored) {
        (Source::Network, Some(stored)) => {
            if acquisition.replaced_corrupt {
                println!("Replaced a corrupt cached archive.");
            }
            println!(
                "Downloaded {} ({}, sha256 {})",
                acquisition.descriptor.filename,
                format_bytes(stored.size),
                stored.sha256
            );
        }
        _ => println!("Using cached {}", acquisition.descriptor.filename),
    }

    for path in &acquisition.installed {
        println!("  {}", path.display());
    }
    println!(
        "Pawn compiler {} installed successfully.",
        acquisition.descriptor.version
    );
}
