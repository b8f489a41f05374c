//! PKCE (Proof Key for Code Exchange) for the authorization code flow
//!
//! Implements RFC 7636 so desktop clients can authorize without shipping a
//! client secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes behind a verifier; 48 bytes encode to 64 characters.
const VERIFIER_BYTES: usize = 48;
const STATE_BYTES: usize = 32;

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a code verifier.
///
/// The result is URL-safe base64 without padding and always falls inside the
/// 43..=128 character range RFC 7636 requires.
#[must_use]
pub fn generate_code_verifier() -> String {
    random_token(VERIFIER_BYTES)
}

/// BASE64URL(SHA256(ASCII(verifier))), no padding.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate an anti-forgery `state` nonce.
#[must_use]
pub fn generate_state() -> String {
    random_token(STATE_BYTES)
}

/// Compare the state sent with the authorization request against the one
/// received on the callback without short-circuiting on the first mismatch.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    expected.bytes().zip(actual.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Verifier, challenge and state for one authorization attempt.
///
/// Lives only in memory for the duration of the attempt.
#[derive(Clone)]
pub struct PkceChallenge {
    /// Sent only with the token exchange.
    pub code_verifier: String,
    /// Sent with the authorization request.
    pub code_challenge: String,
    /// Must round-trip through the callback unchanged.
    pub state: String,
}

impl PkceChallenge {
    /// Generate a fresh challenge.
    ///
    /// # Examples
    /// ```
    /// use streamgate_common::auth::pkce::PkceChallenge;
    ///
    /// let challenge = PkceChallenge::generate();
    /// assert!(challenge.code_verifier.len() >= 43);
    /// assert_eq!(challenge.challenge_method(), "S256");
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge, state: generate_state() }
    }

    /// Always `S256`.
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        "S256"
    }

    #[must_use]
    pub fn matches_state(&self, received: &str) -> bool {
        validate_state(&self.state, received)
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Verifier length stays inside RFC 7636 bounds and uses the URL-safe
    /// alphabet without padding.
    #[test]
    fn test_verifier_shape() {
        let challenge = PkceChallenge::generate();

        assert!((43..=128).contains(&challenge.code_verifier.len()));
        for value in [&challenge.code_verifier, &challenge.code_challenge, &challenge.state] {
            assert!(!value.contains('='));
            assert!(!value.contains('+'));
            assert!(!value.contains('/'));
        }
    }

    /// Challenge matches the RFC 7636 appendix B test vector.
    #[test]
    fn test_challenge_matches_rfc_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(generate_code_challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    /// Two generations never share values.
    #[test]
    fn test_unique_challenges() {
        let first = PkceChallenge::generate();
        let second = PkceChallenge::generate();

        assert_ne!(first.code_verifier, second.code_verifier);
        assert_ne!(first.state, second.state);
    }

    #[test]
    fn test_state_validation() {
        let challenge = PkceChallenge::generate();
        let state = challenge.state.clone();

        assert!(challenge.matches_state(&state));
        assert!(!challenge.matches_state("forged"));
        assert!(!validate_state("abc", "abd"));
        assert!(!validate_state("abc", "abcd"));
    }

    #[test]
    fn test_debug_hides_verifier() {
        let challenge = PkceChallenge::generate();
        let rendered = format!("{challenge:?}");
        assert!(!rendered.contains(&challenge.code_verifier));
    }
}
