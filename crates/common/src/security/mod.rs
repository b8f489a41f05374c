//! Keychain access and secret protection at rest

pub mod keychain;
pub mod secret_store;

pub use keychain::{KeySource, KeychainError, KeychainKeySource, KeychainProvider};
pub use secret_store::{is_protected, SecretProtector, UserSecretStore, PROTECTED_PREFIX};
