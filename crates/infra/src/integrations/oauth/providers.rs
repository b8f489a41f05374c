//! Built-in OAuth endpoints per platform
//!
//! Every value can be overridden per platform in the credential document
//! (`authorize_url`, `token_url`, `scopes`, `redirect_uri`).

use serde_json::{Map, Value};
use streamgate_common::auth::OAuthClientConfig;
use streamgate_domain::constants::{
    DEFAULT_REDIRECT_PATH, KEY_AUTHORIZE_URL, KEY_REDIRECT_URI, KEY_SCOPES, KEY_TOKEN_URL,
};
use streamgate_domain::PlatformId;

/// Default endpoints and scopes of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub scopes: &'static [&'static str],
    pub extra_authorize_params: &'static [(&'static str, &'static str)],
}

const TWITCH: ProviderEndpoints = ProviderEndpoints {
    authorize_url: "https://id.twitch.tv/oauth2/authorize",
    token_url: "https://id.twitch.tv/oauth2/token",
    scopes: &[
        "chat:read",
        "chat:edit",
        "user:read:chat",
        "user:write:chat",
        "moderator:read:followers",
        "channel:read:subscriptions",
        "channel:read:redemptions",
        "bits:read",
    ],
    extra_authorize_params: &[("force_verify", "true")],
};

const YOUTUBE: ProviderEndpoints = ProviderEndpoints {
    authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    scopes: &[
        "https://www.googleapis.com/auth/youtube.readonly",
        "https://www.googleapis.com/auth/youtube.force-ssl",
    ],
    extra_authorize_params: &[("access_type", "offline"), ("prompt", "consent")],
};

const KICK: ProviderEndpoints = ProviderEndpoints {
    authorize_url: "https://id.kick.com/oauth/authorize",
    token_url: "https://id.kick.com/oauth/token",
    scopes: &["user:read", "channel:read", "chat:write", "events:subscribe"],
    extra_authorize_params: &[],
};

const TROVO: ProviderEndpoints = ProviderEndpoints {
    authorize_url: "https://open.trovo.live/page/login.html",
    token_url: "https://open-api.trovo.live/openplatform/exchangetoken",
    scopes: &["user_details_self", "chat_send_self", "send_to_my_channel", "chat_connect"],
    extra_authorize_params: &[],
};

const TWITTER: ProviderEndpoints = ProviderEndpoints {
    authorize_url: "https://twitter.com/i/oauth2/authorize",
    token_url: "https://api.twitter.com/2/oauth2/token",
    scopes: &["tweet.read", "tweet.write", "users.read", "offline.access"],
    extra_authorize_params: &[],
};

/// Built-in endpoints, if the platform has a standard OAuth2 provider.
///
/// DLive has none; its endpoints must come from the credential document.
#[must_use]
pub fn default_endpoints(platform: PlatformId) -> Option<ProviderEndpoints> {
    match platform {
        PlatformId::Twitch => Some(TWITCH),
        PlatformId::Youtube => Some(YOUTUBE),
        PlatformId::Kick => Some(KICK),
        PlatformId::Trovo => Some(TROVO),
        PlatformId::Twitter => Some(TWITTER),
        PlatformId::Dlive => None,
    }
}

/// `http://localhost:{port}/callback`
#[must_use]
pub fn default_redirect_uri(port: u16) -> String {
    format!("http://localhost:{port}{DEFAULT_REDIRECT_PATH}")
}

/// Token endpoint from config, else the provider default.
#[must_use]
pub fn resolve_token_url(platform: PlatformId, config: &Map<String, Value>) -> Option<String> {
    configured_str(config, KEY_TOKEN_URL)
        .or_else(|| default_endpoints(platform).map(|p| p.token_url.to_string()))
}

/// Client registration for `platform`, merging config overrides over the
/// provider defaults. `None` when no authorization endpoint is known.
#[must_use]
pub fn client_config(
    platform: PlatformId,
    config: &Map<String, Value>,
    client_id: String,
    client_secret: Option<String>,
    redirect_port: u16,
) -> Option<OAuthClientConfig> {
    let defaults = default_endpoints(platform);

    let authorize_url = configured_str(config, KEY_AUTHORIZE_URL)
        .or_else(|| defaults.map(|d| d.authorize_url.to_string()))?;
    let token_url = resolve_token_url(platform, config)?;

    let scopes = configured_scopes(config).unwrap_or_else(|| {
        defaults.map(|d| d.scopes.iter().map(|s| (*s).to_string()).collect()).unwrap_or_default()
    });
    let extra_authorize_params = defaults
        .map(|d| {
            d.extra_authorize_params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
        })
        .unwrap_or_default();

    Some(OAuthClientConfig {
        client_id,
        client_secret: client_secret.filter(|s| !s.is_empty()),
        redirect_uri: configured_str(config, KEY_REDIRECT_URI)
            .unwrap_or_else(|| default_redirect_uri(redirect_port)),
        authorize_url,
        token_url,
        scopes,
        extra_authorize_params,
    })
}

fn configured_str(config: &Map<String, Value>, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// `scopes` may be a space/comma separated string or an array.
fn configured_scopes(config: &Map<String, Value>) -> Option<Vec<String>> {
    let scopes: Vec<String> = match config.get(KEY_SCOPES)? {
        Value::String(joined) => joined
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(String::from).collect(),
        _ => return None,
    };
    (!scopes.is_empty()).then_some(scopes)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = client_config(PlatformId::Youtube, &Map::new(), "cid".into(), None, 8889)
            .expect("youtube has defaults");

        assert_eq!(config.token_url, YOUTUBE.token_url);
        assert_eq!(config.redirect_uri, "http://localhost:8889/callback");
        assert!(config.extra_authorize_params.contains(&("access_type".into(), "offline".into())));
    }

    #[test]
    fn document_overrides_win() {
        let overrides = map(json!({
            "token_url": "http://127.0.0.1:9/token",
            "redirect_uri": "http://localhost:9999/callback",
            "scopes": "chat:read, chat:edit"
        }));

        let config =
            client_config(PlatformId::Twitch, &overrides, "cid".into(), Some(String::new()), 8889)
                .unwrap();

        assert_eq!(config.token_url, "http://127.0.0.1:9/token");
        assert_eq!(config.redirect_uri, "http://localhost:9999/callback");
        assert_eq!(config.scopes, vec!["chat:read".to_string(), "chat:edit".to_string()]);
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn dlive_needs_configured_endpoints() {
        assert!(client_config(PlatformId::Dlive, &Map::new(), "cid".into(), None, 8889).is_none());
        assert!(resolve_token_url(PlatformId::Dlive, &Map::new()).is_none());

        let configured = map(json!({
            "authorize_url": "https://dlive.example/o/authorize",
            "token_url": "https://dlive.example/o/token",
            "scopes": ["identity"]
        }));
        let config = client_config(PlatformId::Dlive, &configured, "cid".into(), None, 8889).unwrap();
        assert_eq!(config.scopes, vec!["identity".to_string()]);
    }
}
