//! Text progress display for downloads.

use std::io::Write;
use std::sync::Arc;

use pawnup_toolchain::{ProgressCallback, ProgressEvent};

/// Returns a callback that draws a single updating progress line on stderr.
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|event: ProgressEvent| match event {
        ProgressEvent::Started { url, .. } => {
            eprintln!("Downloading {url}");
        }
        ProgressEvent::Progress {
            downloaded,
            total,
            speed,
        } => {
            eprint!("\r{}     ", format_progress(downloaded, total, speed));
            let _ = std::io::stderr().flush();
        }
        ProgressEvent::Completed { .. } => {
            eprintln!();
        }
    })
}

/// Formats a progress line such as `1.50 MB/3.00 MB (50%) 512.00 KB/s`.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn format_progress(downloaded: u64, total: Option<u64>, speed: u64) -> String {
    let speed = format_speed(speed as f64);
    match total {
        Some(total) if total > 0 => {
            let percent = (downloaded as f64 / total as f64 * 100.0) as u8;
            format!(
                "{}/{} ({percent}%) {speed}",
                format_bytes(downloaded),
                format_bytes(total)
            )
        }
        _ => format!("{} {speed}", format_bytes(downloaded)),
    }
}

/// Formats bytes into a human-readable string (KB, MB, GB).
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats speed (bytes/sec) into a human-readable string.
fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}
