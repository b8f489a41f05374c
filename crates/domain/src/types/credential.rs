//! Typed view over a platform's entry in the credential document

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::platform::PlatformId;
use crate::constants::{
    KEY_BOT_TOKEN_TIMESTAMP, KEY_CLIENT_ID, KEY_CLIENT_SECRET, KEY_EXPIRES_IN, KEY_OAUTH_TOKEN,
    KEY_REFRESH_TOKEN, KEY_STREAMER_TOKEN_TIMESTAMP, KEY_TOKEN_TIMESTAMP,
    TOKEN_EXPIRY_MARGIN_SECS,
};

/// OAuth client registration and token state for one platform.
///
/// Values are always plaintext here; encryption happens at the document
/// boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCredential {
    pub platform: Option<PlatformId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Epoch seconds at which the access token was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// Token lifetime in seconds as reported by the token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl PlatformCredential {
    /// Build the typed view from a decrypted `platforms.<id>` map.
    ///
    /// Empty strings count as absent. Numeric fields accept integers, floats
    /// and numeric strings since older documents stored timestamps as text.
    #[must_use]
    pub fn from_config(platform: PlatformId, config: &Map<String, Value>) -> Self {
        let issued_at = read_i64(config, KEY_TOKEN_TIMESTAMP)
            .or_else(|| read_i64(config, KEY_STREAMER_TOKEN_TIMESTAMP))
            .or_else(|| read_i64(config, KEY_BOT_TOKEN_TIMESTAMP));

        Self {
            platform: Some(platform),
            client_id: read_string(config, KEY_CLIENT_ID),
            client_secret: read_string(config, KEY_CLIENT_SECRET),
            access_token: read_string(config, KEY_OAUTH_TOKEN),
            refresh_token: read_string(config, KEY_REFRESH_TOKEN),
            issued_at,
            expires_in: read_i64(config, KEY_EXPIRES_IN),
        }
    }

    /// Absolute expiry in epoch seconds, when both halves are known.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        match (self.issued_at, self.expires_in) {
            (Some(issued), Some(lifetime)) => Some(issued.saturating_add(lifetime)),
            _ => None,
        }
    }

    /// Whether the stored access token may be used as-is at `now`.
    ///
    /// Tokens without a known expiry are treated as fresh.
    #[must_use]
    pub fn is_fresh_at(&self, now: i64) -> bool {
        match self.expires_at() {
            Some(expires_at) => now < expires_at.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS),
            None => true,
        }
    }

    /// Seconds left before the refresh window opens.
    #[must_use]
    pub fn seconds_until_refresh(&self, now: i64) -> Option<i64> {
        self.expires_at()
            .map(|expires_at| expires_at.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS).saturating_sub(now))
    }

    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

fn read_string(config: &Map<String, Value>, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_i64(config: &Map<String, Value>, key: &str) -> Option<i64> {
    match config.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}
