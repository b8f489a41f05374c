//! OAuth 2.0 types and structures
//!
//! Token endpoint responses and the client registration used to build
//! authorization URLs and token request forms.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::pkce::PkceChallenge;

/// Token endpoint response (RFC 6749 §5.1).
///
/// Providers disagree on a few details: `expires_in` is optional, and
/// `scope` arrives either space-separated or as a JSON array.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_scope")]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl TokenResponse {
    /// Parse a response body, rejecting bodies without a non-empty
    /// `access_token`.
    pub fn from_body(body: &str) -> Result<Self, String> {
        let response: Self = serde_json::from_str(body).map_err(|e| e.to_string())?;
        if response.access_token.is_empty() {
            return Err("empty access_token".to_string());
        }
        Ok(response)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeField {
    Joined(String),
    List(Vec<String>),
}

fn deserialize_scope<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ScopeField>::deserialize(deserializer)?.map(|scope| match scope {
        ScopeField::Joined(joined) => joined,
        ScopeField::List(list) => list.join(" "),
    }))
}

/// OAuth error response (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

/// Client registration and endpoints for one provider.
#[derive(Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    /// Only confidential clients have one.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    /// Provider-specific authorization parameters (e.g. `access_type`).
    pub extra_authorize_params: Vec<(String, String)>,
}

impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl OAuthClientConfig {
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Build the browser URL for the authorization request.
    #[must_use]
    pub fn authorization_url(&self, challenge: &PkceChallenge) -> String {
        let mut params = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.client_id.clone()),
            ("redirect_uri".to_string(), self.redirect_uri.clone()),
            ("scope".to_string(), self.scope_string()),
            ("state".to_string(), challenge.state.clone()),
            ("code_challenge".to_string(), challenge.code_challenge.clone()),
            ("code_challenge_method".to_string(), challenge.challenge_method().to_string()),
        ];
        params.extend(self.extra_authorize_params.iter().cloned());

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.authorize_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.authorize_url)
    }

    /// Form body exchanging an authorization code.
    #[must_use]
    pub fn code_exchange_form(&self, code: &str, code_verifier: &str) -> Vec<(String, String)> {
        let mut form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("code_verifier".to_string(), code_verifier.to_string()),
            ("redirect_uri".to_string(), self.redirect_uri.clone()),
            ("client_id".to_string(), self.client_id.clone()),
        ];
        self.push_secret(&mut form);
        form
    }

    /// Form body for a refresh-token grant.
    #[must_use]
    pub fn refresh_form(&self, refresh_token: &str) -> Vec<(String, String)> {
        let mut form = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
            ("client_id".to_string(), self.client_id.clone()),
        ];
        self.push_secret(&mut form);
        form
    }

    fn push_secret(&self, form: &mut Vec<(String, String)>) {
        if let Some(secret) = self.client_secret.as_deref().filter(|s| !s.is_empty()) {
            form.push(("client_secret".to_string(), secret.to_string()));
        }
    }
}
