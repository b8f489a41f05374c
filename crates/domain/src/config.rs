//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EVENTSUB_WS_URL, DEFAULT_HELIX_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_REDIRECT_PORT,
};
use crate::impl_domain_enum_conversions;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
    #[serde(default)]
    pub eventsub: EventSubConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

/// EventSub endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubConfig {
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// Outbound HTTP settings shared by every adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_domain_enum_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_redirect_port() -> u16 {
    DEFAULT_REDIRECT_PORT
}

fn default_websocket_url() -> String {
    DEFAULT_EVENTSUB_WS_URL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_HELIX_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            redirect_port: default_redirect_port(),
            eventsub: EventSubConfig::default(),
            http: HttpConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for EventSubConfig {
    fn default() -> Self {
        Self { websocket_url: default_websocket_url(), api_base_url: default_api_base_url() }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: default_timeout_seconds(), max_attempts: default_max_attempts() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.redirect_port, 8889);
        assert_eq!(config.http.max_attempts, 3);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"eventsub": {"websocket_url": "ws://127.0.0.1:9000"}, "log_format": "json"}"#)
                .unwrap();
        assert_eq!(config.eventsub.websocket_url, "ws://127.0.0.1:9000");
        assert_eq!(config.eventsub.api_base_url, DEFAULT_HELIX_URL);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
