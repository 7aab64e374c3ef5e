//! Platforms command.

use anyhow::Result;
use pawnup_toolchain::Platform;
use pawnup_toolchain::catalog;

/// Lists catalog platforms, marking the host with `*`.
///
/// # Errors
///
/// This command does not fail.
#[allow(clippy::unnecessary_wraps)]
pub fn execute() -> Result<()> {
    let host = Platform::detect().ok();

    for descriptor in catalog::descriptors() {
        let marker = if Some(descriptor.platform) == host {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<8} {:<7} {}",
            descriptor.platform.as_str(),
            descriptor.format.as_str(),
            descriptor.locator
        );
    }
    Ok(())
}
