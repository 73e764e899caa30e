//! Retry classification and bounded exponential backoff.
//!
//! Failures are classified into a [`FailureType`]; the [`RetryPolicy`] then
//! decides whether another attempt is worthwhile and how long to wait.
//! Only network-level failures are ever transient: a listing that is
//! rejected on title mismatch is deterministic for the same inputs and
//! never reaches this layer.
//!
//! The default policy performs no retries at all; callers opt in via
//! [`RetryPolicy::with_max_attempts`].

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::download::DownloadError;

use super::FetchError;

/// Default maximum attempts (a single attempt, i.e. retries disabled).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to delays (500ms).
const MAX_JITTER_MS: u64 = 500;

/// Classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: timeout, connection refused, 5xx server errors, 429.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404, invalid URL, malformed listing page.
    Permanent,
}

/// Classifies a fetch error for the retry layer.
#[must_use]
pub fn classify_fetch_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::Network { .. } | FetchError::Timeout { .. } => FailureType::Transient,
        FetchError::HttpStatus { status, .. } if *status == 429 || *status >= 500 => {
            FailureType::Transient
        }
        _ => FailureType::Permanent,
    }
}

/// Classifies a download error for the retry layer.
#[must_use]
pub fn classify_download_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::Network { .. } | DownloadError::Timeout { .. } => FailureType::Transient,
        DownloadError::HttpStatus { status, .. } if *status == 429 || *status >= 500 => {
            FailureType::Transient
        }
        _ => FailureType::Permanent,
    }
}

/// Decision on whether to retry a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for bounded retry with exponential backoff and jitter.
///
/// Delay calculation: `min(base_delay * multiplier^(attempt-1), max_delay) + jitter`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy allowing up to `max_attempts` total attempts.
    ///
    /// Values below 1 are clamped to 1 (at least one attempt always runs).
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Total attempts this policy allows.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether `attempt` (1-indexed, already completed) should be
    /// followed by another attempt.
    #[must_use]
    pub fn should_retry(&self, failure: FailureType, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("attempt limit reached ({})", self.max_attempts),
            };
        }
        match failure {
            FailureType::Permanent => RetryDecision::DoNotRetry {
                reason: "permanent failure".to_string(),
            },
            FailureType::Transient => {
                let delay = self.delay_for_attempt(attempt);
                debug!(?delay, attempt = attempt + 1, "Scheduling retry");
                RetryDecision::Retry {
                    delay,
                    attempt: attempt + 1,
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let multiplier = self.backoff_multiplier.powi(exponent as i32);
        let scaled_ms = (self.base_delay.as_millis() as f32) * multiplier;
        let capped = Duration::from_millis(scaled_ms as u64).min(self.max_delay);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS));
        capped + jitter
    }
}
