//! AES-256-GCM sealing primitives.
//!
//! - [`EncryptionService`]: seals and opens byte payloads under one 32-byte
//!   key
//! - [`SealedPayload`]: nonce plus ciphertext, packed as `nonce || ciphertext`
//!
//! Key custody is handled one level up in `security::secret_store`.
//!
//! ```rust
//! use streamgate_common::crypto::encryption::EncryptionService;
//!
//! let service = EncryptionService::new(EncryptionService::generate_key())?;
//! let sealed = service.seal(b"refresh-token")?;
//! assert_eq!(service.open(&sealed)?, b"refresh-token");
//! # Ok::<(), streamgate_common::error::CommonError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{CommonError, CommonResult};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

/// Nonce and ciphertext of one sealed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Pack as `nonce || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Split a packed payload.
    ///
    /// # Errors
    /// Fails when the input is too short to hold a nonce and a GCM tag.
    pub fn from_bytes(bytes: &[u8]) -> CommonResult<Self> {
        if bytes.len() <= NONCE_LEN {
            return Err(CommonError::validation("payload", "sealed payload is truncated"));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| CommonError::validation("payload", "nonce must be 12 bytes"))?;
        Ok(Self { nonce, ciphertext: ciphertext.to_vec() })
    }
}

/// AES-256-GCM service bound to a single key.
pub struct EncryptionService {
    key: Vec<u8>,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &"[REDACTED]")
            .field("fingerprint", &self.key_fingerprint())
            .finish()
    }
}

impl EncryptionService {
    /// Create a service from a raw 32-byte key.
    ///
    /// # Errors
    /// Fails when the key is not exactly 32 bytes.
    pub fn new(key: Vec<u8>) -> CommonResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CommonError::validation("key", "encryption key must be exactly 32 bytes"));
        }

        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| {
            CommonError::internal(format!("Failed to create encryption cipher: {e}"))
        })?;

        Ok(Self { key, cipher })
    }

    /// Generate a random 32-byte key.
    #[must_use]
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt under a fresh random nonce.
    pub fn encrypt(&self, data: &[u8]) -> CommonResult<SealedPayload> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), data)
            .map_err(|e| CommonError::internal(format!("Encryption failed: {e}")))?;

        Ok(SealedPayload { nonce, ciphertext })
    }

    /// Decrypt and authenticate a payload.
    pub fn decrypt(&self, payload: &SealedPayload) -> CommonResult<Vec<u8>> {
        self.cipher
            .decrypt(Nonce::from_slice(&payload.nonce), payload.ciphertext.as_ref())
            .map_err(|e| CommonError::internal(format!("Decryption failed: {e}")))
    }

    /// Encrypt and pack into bytes.
    pub fn seal(&self, data: &[u8]) -> CommonResult<Vec<u8>> {
        Ok(self.encrypt(data)?.to_bytes())
    }

    /// Unpack and decrypt bytes produced by [`Self::seal`].
    pub fn open(&self, sealed: &[u8]) -> CommonResult<Vec<u8>> {
        self.decrypt(&SealedPayload::from_bytes(sealed)?)
    }

    /// Seal and encode as standard base64.
    pub fn encrypt_to_string(&self, data: &[u8]) -> CommonResult<String> {
        Ok(BASE64.encode(self.seal(data)?))
    }

    /// Decode standard base64 and open.
    pub fn decrypt_from_string(&self, encoded: &str) -> CommonResult<Vec<u8>> {
        let sealed = BASE64
            .decode(encoded)
            .map_err(|e| CommonError::serialization("base64", e.to_string()))?;
        self.open(&sealed)
    }

    /// Short, non-reversible identifier for the key, safe to log.
    #[must_use]
    pub fn key_fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.key);
        hex::encode(&digest[..8])
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for crypto::encryption.
    use super::*;

    /// Keys shorter than 32 bytes are rejected.
    #[test]
    fn new_service_rejects_invalid_key_size() {
        assert!(EncryptionService::new(vec![0; 16]).is_err());
        assert_eq!(EncryptionService::generate_key().len(), KEY_LEN);
    }

    /// Base64 sealing reverses under the same key.
    #[test]
    fn encrypt_to_and_from_string_round_trip() {
        let service = EncryptionService::new(EncryptionService::generate_key()).unwrap();

        let encoded = service.encrypt_to_string(b"oauth:abc123").unwrap();
        assert_eq!(service.decrypt_from_string(&encoded).unwrap(), b"oauth:abc123");
    }

    /// Each seal uses a new nonce.
    #[test]
    fn sealing_same_value_twice_differs() {
        let service = EncryptionService::new(EncryptionService::generate_key()).unwrap();
        assert_ne!(service.seal(b"same").unwrap(), service.seal(b"same").unwrap());
    }

    /// Opening under a different key fails authentication.
    #[test]
    fn wrong_key_fails() {
        let first = EncryptionService::new(EncryptionService::generate_key()).unwrap();
        let second = EncryptionService::new(EncryptionService::generate_key()).unwrap();

        let sealed = first.seal(b"secret").unwrap();
        assert!(second.open(&sealed).is_err());
    }

    /// Truncated or tampered payloads are rejected.
    #[test]
    fn tampered_payload_fails() {
        let service = EncryptionService::new(EncryptionService::generate_key()).unwrap();
        let mut sealed = service.seal(b"secret").unwrap();

        assert!(service.open(&sealed[..NONCE_LEN]).is_err());
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(service.open(&sealed).is_err());
        assert!(service.decrypt_from_string("not base64!").is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let key = EncryptionService::generate_key();
        let a = EncryptionService::new(key.clone()).unwrap();
        let b = EncryptionService::new(key).unwrap();
        assert_eq!(a.key_fingerprint(), b.key_fingerprint());
        assert_eq!(a.key_fingerprint().len(), 16);
    }
}
