//! Retry and addressing helpers shared by cloud-backed sinks and sources.

use crate::io::cloud::traits::{CloudIOError, CloudResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Retry Helper
// ============================================================================

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that tries exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based), capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(ms)
    }
}

/// Retry a function with exponential backoff
///
/// Only transient failures ([`ErrorKind::is_transient`]) are retried; any
/// other error is returned immediately.
///
/// # Errors
///
/// Returns the last error once `max_attempts` is reached, or the first
/// non-transient error.
pub fn retry_with_backoff<F, T>(config: &RetryConfig, mut operation: F) -> CloudResult<T>
where
    F: FnMut() -> CloudResult<T>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation() {
            Ok(result) => return Ok(result),
            Err(err) if !err.kind.is_transient() || attempt >= max_attempts => {
                return Err(err);
            }
            Err(err) => {
                let delay = config.delay_for(attempt);
                tracing::debug!(attempt, ?delay, error = %err, "retrying transient failure");
                std::thread::sleep(delay);
            }
        }
    }
}

// ============================================================================
// Addressing Helpers
// ============================================================================

/// Join an object prefix and a file name with exactly one `/`.
#[must_use]
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{prefix}/{file_name}")
    }
}

/// Validate a bucket name: 3-63 chars of lowercase letters, digits, `-`, `_`
/// and `.`, starting and ending with a letter or digit.
///
/// # Errors
///
/// Returns an `InvalidInput` error describing the first rule broken.
pub fn validate_bucket_name(name: &str) -> CloudResult<()> {
    if !(3..=63).contains(&name.len()) {
        return Err(CloudIOError::new(
            ErrorKind::InvalidInput,
            format!("bucket name `{name}` must be 3-63 characters"),
        ));
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        return Err(CloudIOError::new(
            ErrorKind::InvalidInput,
            format!("bucket name `{name}` must start and end with a letter or digit"),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CloudIOError::new(
            ErrorKind::InvalidInput,
            format!("bucket name `{name}` contains invalid character `{bad}`"),
        ));
    }
    Ok(())
}
