//! Backoff for retrying failed downloads.

use std::time::Duration;

use rand::Rng;

/// Base delay between retries in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Calculates the retry delay with exponential backoff and jitter.
///
/// `attempt` counts retries from 1. The delay doubles with each attempt
/// (1s, 2s, 4s, ...) with +/- 25% jitter, and stops growing after the sixth.
pub fn calculate_retry_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let base_delay = BASE_RETRY_DELAY_MS * 2u64.pow(exponent);
    let jitter_range = base_delay / 4;
    let jitter = rand::rng().random_range(0..=jitter_range * 2);
    Duration::from_millis(base_delay - jitter_range + jitter)
}
