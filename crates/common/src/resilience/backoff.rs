//! Backoff policy for HTTP retries
//!
//! Attempts are 1-based. After a failed attempt `n` (with `n < max_attempts`)
//! the caller waits either the exact `Retry-After` seconds the server asked
//! for, or `base^n` seconds plus up to half a second of jitter.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// Status codes that are worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound (exclusive) of the random jitter added to computed delays.
pub const MAX_JITTER: Duration = Duration::from_millis(500);

#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Parse a `Retry-After` header given in delta-seconds.
///
/// HTTP-date values and anything non-numeric yield `None`, which makes the
/// caller fall back to the computed delay.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Whether and how long to wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Stop,
}

/// Exponential backoff with bounded jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    max_attempts: u32,
    base_secs: f64,
    max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, base_secs: 2.0, max_jitter: MAX_JITTER }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), ..Self::default() }
    }

    #[must_use]
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), ..self.clone() }
    }

    /// Disable jitter, mostly for deterministic tests.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// `base^attempt` seconds plus jitter in `[0, max_jitter)`.
    #[must_use]
    pub fn computed_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = Duration::from_secs_f64(self.base_secs.powi(exponent).min(3600.0));
        if self.max_jitter.is_zero() {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0.0..self.max_jitter.as_secs_f64());
        base + Duration::from_secs_f64(jitter)
    }

    /// Delay for the next attempt, honouring a server hint when present.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.computed_delay(attempt))
    }

    /// Decide after attempt `attempt` answered with `status`.
    #[must_use]
    pub fn decide_status(
        &self,
        status: u16,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if is_retryable_status(status) && self.has_attempts_left(attempt) {
            RetryDecision::RetryAfter(self.delay_for(attempt, retry_after))
        } else {
            RetryDecision::Stop
        }
    }

    /// Decide after attempt `attempt` failed at the transport level.
    #[must_use]
    pub fn decide_transport_error(&self, retryable: bool, attempt: u32) -> RetryDecision {
        if retryable && self.has_attempts_left(attempt) {
            RetryDecision::RetryAfter(self.computed_delay(attempt))
        } else {
            RetryDecision::Stop
        }
    }
}

/// Performs the wait between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
