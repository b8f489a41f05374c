//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory key source and a sleeper that records delays
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use streamgate_common::security::{SecretProtector, UserSecretStore};
//! use streamgate_common::testing::StaticKeySource;
//!
//! let store = UserSecretStore::new(Arc::new(StaticKeySource::random()));
//! let token = store.protect("oauth:abc").unwrap();
//! assert_eq!(store.unprotect(&token), "oauth:abc");
//! ```

pub mod mocks;

pub use mocks::{RecordingSleeper, StaticKeySource};
