//! Platform keychain access
//!
//! Thin wrapper over `keyring` for storing secrets under a service name in
//! the current user's keychain (macOS Keychain, Windows Credential Manager,
//! Secret Service on Linux).
//!
//! ```no_run
//! use streamgate_common::security::keychain::KeychainProvider;
//!
//! let keychain = KeychainProvider::new("StreamGate");
//! keychain.set_secret("service_account", "super-secret")?;
//! assert_eq!(keychain.get_secret("service_account")?, "super-secret");
//! # Ok::<(), streamgate_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

use crate::crypto::encryption::{EncryptionService, KEY_LEN};

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    #[error("Entry not found")]
    NotFound,

    /// Stored key material could not be decoded.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

/// Supplies the symmetric key used to seal secrets.
///
/// Implementations create the key on first use and return the same bytes on
/// every later call.
pub trait KeySource: Send + Sync {
    /// # Errors
    /// Returns an error when the key cannot be read or created.
    fn load_or_create_key(&self) -> Result<Vec<u8>, KeychainError>;
}

/// Keychain provider scoped to one service name.
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a secret value.
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })
    }

    /// Retrieve a secret value.
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if the secret doesn't exist and
    /// `KeychainError::AccessFailed` if keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => KeychainError::NotFound,
            other => {
                KeychainError::AccessFailed(format!("Failed to retrieve secret for {key}: {other}"))
            }
        })
    }

    /// Delete a secret (idempotent).
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }

    /// Return the hex-encoded 32-byte key stored under `key_id`, generating
    /// and storing one when absent.
    pub fn get_or_create_key(&self, key_id: &str) -> Result<Vec<u8>, KeychainError> {
        match self.get_secret(key_id) {
            Ok(encoded) => {
                let key = hex::decode(encoded.trim())
                    .map_err(|e| KeychainError::InvalidKey(e.to_string()))?;
                if key.len() != KEY_LEN {
                    return Err(KeychainError::InvalidKey(format!(
                        "expected {KEY_LEN} bytes, found {}",
                        key.len()
                    )));
                }
                Ok(key)
            }
            Err(KeychainError::NotFound) => {
                debug!(
                    service = %self.service_name,
                    key_id = %key_id,
                    "No existing key found, generating new key"
                );
                let key = EncryptionService::generate_key();
                self.set_secret(key_id, &hex::encode(&key))?;
                Ok(key)
            }
            Err(e) => Err(e),
        }
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

/// [`KeySource`] backed by one keychain entry.
#[derive(Debug, Clone)]
pub struct KeychainKeySource {
    provider: KeychainProvider,
    key_id: String,
}

impl KeychainKeySource {
    pub fn new(provider: KeychainProvider, key_id: impl Into<String>) -> Self {
        Self { provider, key_id: key_id.into() }
    }
}

impl KeySource for KeychainKeySource {
    fn load_or_create_key(&self) -> Result<Vec<u8>, KeychainError> {
        self.provider.get_or_create_key(&self.key_id)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for security::keychain. Real keychain access is not
    //! exercised here since CI hosts have no secret service.
    use super::*;

    #[test]
    fn test_keychain_provider_creation() {
        let keychain = KeychainProvider::new("StreamGateTest");
        assert_eq!(keychain.service_name(), "StreamGateTest");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(KeychainError::NotFound.to_string(), "Entry not found");
        assert!(KeychainError::InvalidKey("odd length".into()).to_string().contains("odd length"));
    }
}
