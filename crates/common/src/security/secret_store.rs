//! User-scoped protection of secrets at rest
//!
//! Values are sealed with AES-256-GCM under a key that lives in the current
//! user's keychain, then written as `ENC:` followed by standard base64. A
//! document copied to another machine or account cannot be opened there.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::keychain::KeySource;
use crate::crypto::encryption::EncryptionService;
use crate::error::{CommonError, CommonResult};

/// Marker prefix of protected values.
pub const PROTECTED_PREFIX: &str = "ENC:";

/// Whether a stored value carries the protection marker.
#[must_use]
pub fn is_protected(value: &str) -> bool {
    value.starts_with(PROTECTED_PREFIX)
}

/// Protects and recovers individual secret strings.
pub trait SecretProtector: Send + Sync {
    /// Seal `plaintext`. Empty input yields an empty token.
    ///
    /// # Errors
    /// Returns an error when the key is unavailable or sealing fails.
    fn protect(&self, plaintext: &str) -> CommonResult<String>;

    /// Recover the plaintext of a token.
    ///
    /// Unmarked values are returned unchanged. A marked value that cannot be
    /// opened yields an empty string.
    fn unprotect(&self, token: &str) -> String;
}

/// [`SecretProtector`] keyed from a [`KeySource`], loaded once on first use.
pub struct UserSecretStore {
    key_source: Arc<dyn KeySource>,
    service: OnceCell<EncryptionService>,
}

impl std::fmt::Debug for UserSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSecretStore").field("key_loaded", &self.service.get().is_some()).finish()
    }
}

impl UserSecretStore {
    pub fn new(key_source: Arc<dyn KeySource>) -> Self {
        Self { key_source, service: OnceCell::new() }
    }

    fn service(&self) -> CommonResult<&EncryptionService> {
        self.service.get_or_try_init(|| {
            let key = self
                .key_source
                .load_or_create_key()
                .map_err(|e| CommonError::config(format!("secret key unavailable: {e}")))?;
            let service = EncryptionService::new(key)?;
            debug!(fingerprint = %service.key_fingerprint(), "Loaded secret store key");
            Ok(service)
        })
    }

    fn open(&self, encoded: &str) -> CommonResult<String> {
        let bytes = self.service()?.decrypt_from_string(encoded)?;
        String::from_utf8(bytes).map_err(|e| CommonError::serialization("utf-8", e.to_string()))
    }
}

impl SecretProtector for UserSecretStore {
    fn protect(&self, plaintext: &str) -> CommonResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let encoded = self.service()?.encrypt_to_string(plaintext.as_bytes())?;
        Ok(format!("{PROTECTED_PREFIX}{encoded}"))
    }

    fn unprotect(&self, token: &str) -> String {
        let Some(encoded) = token.strip_prefix(PROTECTED_PREFIX) else {
            return token.to_string();
        };
        if encoded.is_empty() {
            return String::new();
        }
        match self.open(encoded) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(error = %e, "Failed to unprotect stored secret; treating it as empty");
                String::new()
            }
        }
    }
}
