//! Transport-level retry policy for HTTP-backed endpoints.
//!
//! The recovery loop itself never retries transport failures; an endpoint
//! may, as its own explicitly configured concern. [`BackoffConfig`] controls
//! how transient HTTP errors (429, 5xx, connection resets) are retried with
//! increasing delays. For a local model server use [`BackoffConfig::none()`];
//! for hosted APIs use [`BackoffConfig::standard()`].

use std::time::Duration;

use crate::error::RecoverError;

/// Retry policy with exponential backoff and jitter.
///
/// # Example
///
/// ```
/// use llm_recover::endpoint::BackoffConfig;
///
/// let none = BackoffConfig::none();
/// assert_eq!(none.max_retries, 0);
///
/// let standard = BackoffConfig::standard();
/// assert_eq!(standard.max_retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Maximum number of transport retries. Default: 0 (no retry).
    pub max_retries: u32,

    /// Delay before the first retry. Default: 1 second.
    pub initial_delay: Duration,

    /// Multiplier applied after each retry. Default: 2.0.
    pub multiplier: f64,

    /// Cap on the delay between retries. Default: 60 seconds.
    pub max_delay: Duration,

    /// Jitter strategy. Default: Full.
    pub jitter: JitterStrategy,

    /// HTTP status codes that trigger retry. Default: `[429, 500, 502, 503, 504]`.
    pub retryable_statuses: Vec<u16>,

    /// Whether to honor `Retry-After` headers from the provider. Default: `true`.
    pub respect_retry_after: bool,
}

/// Jitter strategy to avoid thundering herd on shared rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterStrategy {
    /// No jitter. Delay is exactly the calculated value.
    None,
    /// Random value in `[0, calculated_delay]`.
    Full,
    /// `calculated_delay/2 + random in [0, calculated_delay/2]`.
    Equal,
}

impl BackoffConfig {
    /// No transport retry. The default — local servers fail fast.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::standard()
        }
    }

    /// Sensible defaults for hosted APIs: 3 retries, 1s initial, 2x
    /// multiplier, 60s cap, full jitter, honors Retry-After.
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            jitter: JitterStrategy::Full,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }

    /// Conservative settings for interactive use (a user is waiting):
    /// 2 retries, 500ms initial, 10s cap.
    pub fn interactive() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            multiplier: 1.5,
            max_delay: Duration::from_secs(10),
            jitter: JitterStrategy::Full,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }

    /// Delay for retry N (0-indexed): `initial_delay * multiplier^n`,
    /// capped at `max_delay`, with jitter applied.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        let jittered = match self.jitter {
            JitterStrategy::None => capped,
            JitterStrategy::Full => fastrand::f64() * capped,
            JitterStrategy::Equal => capped / 2.0 + fastrand::f64() * (capped / 2.0),
        };

        Duration::from_secs_f64(jittered)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Whether a failed request should be retried at the transport layer.
///
/// Retryable: HTTP status in `retryable_statuses`, or a connection/transport
/// error. Everything else (4xx client errors, validation failures,
/// cancellation) is not.
pub fn is_retryable(error: &RecoverError, config: &BackoffConfig) -> bool {
    match error {
        RecoverError::Http { status, .. } => config.retryable_statuses.contains(status),
        RecoverError::Request(_) => true,
        _ => false,
    }
}
