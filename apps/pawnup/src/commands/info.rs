//! Info command: resolve a version without downloading anything.

use anyhow::{Context, Result};
use clap::Args;
use pawnup_toolchain::{Platform, package_info};

use super::GlobalArgs;

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Compiler version (e.g., "3.10.10").
    pub version: String,

    /// Target platform: darwin, linux or windows.
    ///
    /// Defaults to the platform pawnup is running on.
    #[clap(long)]
    pub platform: Option<String>,

    /// Print JSON instead of text.
    #[clap(long)]
    pub json: bool,
}

/// Executes the info command.
///
/// # Errors
///
/// Returns an error if the platform or version cannot be resolved.
pub fn execute(args: &InfoArgs, global: &GlobalArgs) -> Result<()> {
    let platform = match &args.platform {
        Some(platform) => platform.clone(),
        None => Platform::detect()
            .context("Failed to detect platform; pass --platform")?
            .to_string(),
    };
    let descriptor = package_info(&platform, &args.version)?;

    let settings = global.settings()?;
    let cache = global.cache(&settings)?;
    let cache_path = cache.entry_path(&descriptor.filename)?;
    let cached = cache.has(&descriptor.filename);

    if args.json {
        let mut value =
            serde_json::to_value(&descriptor).context("Failed to serialize package info")?;
        value["cache_path"] = serde_json::json!(cache_path);
        value["cached"] = serde_json::json!(cached);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Platform:  {}", descriptor.platform);
    println!("Version:   {}", descriptor.version);
    println!("URL:       {}", descriptor.locator);
    println!("Format:    {}", descriptor.format.as_str());
    println!(
        "Cache:     {}{}",
        cache_path.display(),
        if cached { " (cached)" } else { "" }
    );
    println!("Installs:");
    for mapping in &descriptor.path_map {
        println!("  {} -> {}", mapping.member, mapping.install.display());
    }
    Ok(())
}
