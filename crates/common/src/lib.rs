//! Modular common utilities shared across StreamGate crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors
//! - `runtime`: encryption and retry backoff
//! - `platform`: OAuth/PKCE and keychain-backed secret protection
//! - `test-utils`: deterministic key source and sleeper

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod crypto;
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "platform", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{OAuthClientConfig, PkceChallenge, TokenResponse};
#[cfg(feature = "runtime")]
pub use crypto::EncryptionService;
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{BackoffPolicy, Sleeper, TokioSleeper};
#[cfg(feature = "platform")]
pub use security::{KeySource, KeychainError, KeychainProvider, SecretProtector, UserSecretStore};
