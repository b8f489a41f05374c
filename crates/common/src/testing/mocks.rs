//! Mock implementations of common traits
//!
//! Deterministic stand-ins for the key source and the backoff sleeper.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::crypto::encryption::EncryptionService;
use crate::resilience::Sleeper;
use crate::security::{KeySource, KeychainError};

/// Key source holding a fixed key in memory.
///
/// ```
/// use streamgate_common::security::KeySource;
/// use streamgate_common::testing::StaticKeySource;
///
/// let source = StaticKeySource::new(vec![7u8; 32]);
/// assert_eq!(source.load_or_create_key().unwrap(), vec![7u8; 32]);
/// assert_eq!(source.load_count(), 1);
/// ```
#[derive(Debug)]
pub struct StaticKeySource {
    key: Option<Vec<u8>>,
    loads: AtomicUsize,
}

impl StaticKeySource {
    pub fn new(key: Vec<u8>) -> Self {
        Self { key: Some(key), loads: AtomicUsize::new(0) }
    }

    /// A fresh random 32-byte key.
    pub fn random() -> Self {
        Self::new(EncryptionService::generate_key())
    }

    /// A source whose keychain is unreachable.
    pub fn unavailable() -> Self {
        Self { key: None, loads: AtomicUsize::new(0) }
    }

    /// Number of times the key was requested.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl KeySource for StaticKeySource {
    fn load_or_create_key(&self) -> Result<Vec<u8>, KeychainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.key
            .clone()
            .ok_or_else(|| KeychainError::AccessFailed("keychain unavailable".to_string()))
    }
}

/// Sleeper that records requested delays and returns immediately.
///
/// ```
/// # tokio_test::block_on(async {
/// use std::time::Duration;
/// use streamgate_common::resilience::Sleeper;
/// use streamgate_common::testing::RecordingSleeper;
///
/// let sleeper = RecordingSleeper::new();
/// sleeper.sleep(Duration::from_secs(2)).await;
/// assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.delays.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}
