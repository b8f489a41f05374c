//! OAuth 2.0 + PKCE building blocks
//!
//! Transport-free pieces of the authorization code flow. The loopback
//! listener, HTTP exchange and token persistence live in the infra crate.
//!
//! - **[`pkce`]**: verifier, challenge and state generation
//! - **[`types`]**: token responses and client registration

pub mod pkce;
pub mod types;

pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state,
    PkceChallenge,
};
pub use types::{OAuthClientConfig, OAuthError, TokenResponse};
