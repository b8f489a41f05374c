//! Retry and backoff primitives shared by network adapters

pub mod backoff;

pub use backoff::{
    is_retryable_status, parse_retry_after, BackoffPolicy, RetryDecision, Sleeper, TokioSleeper,
    DEFAULT_MAX_ATTEMPTS, MAX_JITTER, RETRYABLE_STATUSES,
};
