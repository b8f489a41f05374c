//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// OAuth flow
pub const DEFAULT_REDIRECT_PORT: u16 = 8889;
pub const DEFAULT_REDIRECT_PATH: &str = "/callback";
pub const OAUTH_CALLBACK_TIMEOUT_SECS: u64 = 120;
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
pub const CLIENT_ID_PLACEHOLDER_PREFIXES: &[&str] = &["YOUR_", "your_", "<", "changeme"];

// Credential document fields sealed at rest
pub const SENSITIVE_FIELDS: &[&str] = &[
    "oauth_token",
    "access_token",
    "refresh_token",
    "client_secret",
    "api_key",
    "cookies",
    "session_cookie",
];

// Credential document keys
pub const PLATFORMS_KEY: &str = "platforms";
pub const KEY_CLIENT_ID: &str = "client_id";
pub const KEY_CLIENT_SECRET: &str = "client_secret";
pub const KEY_OAUTH_TOKEN: &str = "oauth_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_EXPIRES_IN: &str = "expires_in";
pub const KEY_TOKEN_TIMESTAMP: &str = "token_timestamp";
pub const KEY_BOT_TOKEN_TIMESTAMP: &str = "bot_token_timestamp";
pub const KEY_STREAMER_TOKEN_TIMESTAMP: &str = "streamer_token_timestamp";
pub const KEY_REDIRECT_URI: &str = "redirect_uri";
pub const KEY_TOKEN_URL: &str = "token_url";
pub const KEY_AUTHORIZE_URL: &str = "authorize_url";
pub const KEY_SCOPES: &str = "scopes";
pub const USER_ID_FALLBACK_KEYS: &[&str] = &["streamer_user_id", "broadcaster_user_id", "user_id"];

// HTTP retry policy
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// EventSub transport
pub const DEFAULT_EVENTSUB_WS_URL: &str = "wss://eventsub.wss.twitch.tv/ws";
pub const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";
pub const REDEMPTION_EVENT_MARKER: &str = "channel_points_custom_reward_redemption";
