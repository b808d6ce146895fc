//! Retry utilities for transient store failures.
//!
//! Provides classification of retryable errors and exponential backoff.

use crate::error::StoreError;
use rusqlite::ErrorCode;
use std::time::Duration;

/// Determine whether a store error is worth retrying.
///
/// Retryable errors: a write or commit that hit a busy or locked database.
/// Non-retryable: connect failures, constraint violations, corrupt files.
pub fn is_retryable(error: &StoreError) -> bool {
    match error {
        StoreError::Write(rusqlite::Error::SqliteFailure(e, _)) => {
            matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}
