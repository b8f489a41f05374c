//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment when one exists
//! 2. Attempts to load from environment variables
//! 3. If `STREAMGATE_CREDENTIALS_PATH` is not set, falls back to a config file
//! 4. Searches multiple paths for config files (JSON and TOML)
//! 5. With no file anywhere, uses built-in defaults
//!
//! ## Environment Variables
//! - `STREAMGATE_CREDENTIALS_PATH`: Credential document path (required for
//!   env loading)
//! - `STREAMGATE_REDIRECT_PORT`: OAuth loopback port
//! - `STREAMGATE_EVENTSUB_WS_URL`: EventSub websocket endpoint
//! - `STREAMGATE_HELIX_URL`: Helix REST base URL
//! - `STREAMGATE_HTTP_TIMEOUT`: Per-request timeout in seconds
//! - `STREAMGATE_HTTP_MAX_ATTEMPTS`: Attempts per HTTP call
//! - `STREAMGATE_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader looks for `streamgate.json` and `streamgate.toml` in the current
//! working directory, its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use streamgate_domain::{AppConfig, LogFormat, Result, StreamGateError};

const ENV_CREDENTIALS_PATH: &str = "STREAMGATE_CREDENTIALS_PATH";
const ENV_REDIRECT_PORT: &str = "STREAMGATE_REDIRECT_PORT";
const ENV_EVENTSUB_WS_URL: &str = "STREAMGATE_EVENTSUB_WS_URL";
const ENV_HELIX_URL: &str = "STREAMGATE_HELIX_URL";
const ENV_HTTP_TIMEOUT: &str = "STREAMGATE_HTTP_TIMEOUT";
const ENV_HTTP_MAX_ATTEMPTS: &str = "STREAMGATE_HTTP_MAX_ATTEMPTS";
const ENV_LOG_FORMAT: &str = "STREAMGATE_LOG_FORMAT";

const CONFIG_FILE_NAMES: [&str; 2] = ["streamgate.json", "streamgate.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `StreamGateError::Config` if an environment value or the discovered
/// config file is invalid.
pub fn load() -> Result<AppConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(StreamGateError::Config(reason)) if reason.starts_with(MISSING_VAR) => {
            tracing::debug!(reason = %reason, "Environment incomplete, trying file");
            match discover_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::info!("No config file found, using defaults");
                    Ok(AppConfig::default())
                }
            }
        }
        Err(err) => Err(err),
    }
}

const MISSING_VAR: &str = "Missing required environment variable";

/// Load configuration from environment variables
///
/// `STREAMGATE_CREDENTIALS_PATH` must be set; every other variable is
/// optional and falls back to its default.
///
/// # Errors
/// Returns `StreamGateError::Config` if the required variable is missing or
/// any variable has an invalid value.
pub fn load_from_env() -> Result<AppConfig> {
    let mut config =
        AppConfig { credentials_path: env_var(ENV_CREDENTIALS_PATH)?, ..AppConfig::default() };

    if let Some(port) = env_parse::<u16>(ENV_REDIRECT_PORT)? {
        config.redirect_port = port;
    }
    if let Ok(url) = std::env::var(ENV_EVENTSUB_WS_URL) {
        config.eventsub.websocket_url = url;
    }
    if let Ok(url) = std::env::var(ENV_HELIX_URL) {
        config.eventsub.api_base_url = url;
    }
    if let Some(timeout) = env_parse::<u64>(ENV_HTTP_TIMEOUT)? {
        config.http.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_parse::<u32>(ENV_HTTP_MAX_ATTEMPTS)? {
        config.http.max_attempts = attempts.max(1);
    }
    if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
        config.log_format = LogFormat::from_str(&format).map_err(|e| {
            StreamGateError::Config(format!("Invalid {ENV_LOG_FORMAT}: {e}"))
        })?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations.
///
/// # Errors
/// Returns `StreamGateError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StreamGateError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => discover_config_paths().ok_or_else(|| {
            StreamGateError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StreamGateError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, picking the format from the file extension.
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StreamGateError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StreamGateError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(StreamGateError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing `streamgate.{json,toml}` in the standard locations.
pub fn discover_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        let parent = cwd.join("..");
        dirs.extend([cwd, parent]);
    }

    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| StreamGateError::Config(format!("{MISSING_VAR}: {key}")))
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| StreamGateError::Config(format!("Invalid {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 7] = [
        ENV_CREDENTIALS_PATH,
        ENV_REDIRECT_PORT,
        ENV_EVENTSUB_WS_URL,
        ENV_HELIX_URL,
        ENV_HTTP_TIMEOUT,
        ENV_HTTP_MAX_ATTEMPTS,
        ENV_LOG_FORMAT,
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_CREDENTIALS_PATH, "/tmp/creds.json");
        std::env::set_var(ENV_REDIRECT_PORT, "9100");
        std::env::set_var(ENV_EVENTSUB_WS_URL, "ws://127.0.0.1:8080/ws");
        std::env::set_var(ENV_HELIX_URL, "http://127.0.0.1:8081");
        std::env::set_var(ENV_HTTP_TIMEOUT, "5");
        std::env::set_var(ENV_HTTP_MAX_ATTEMPTS, "4");
        std::env::set_var(ENV_LOG_FORMAT, "JSON");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.credentials_path, "/tmp/creds.json");
        assert_eq!(config.redirect_port, 9100);
        assert_eq!(config.eventsub.websocket_url, "ws://127.0.0.1:8080/ws");
        assert_eq!(config.eventsub.api_base_url, "http://127.0.0.1:8081");
        assert_eq!(config.http.timeout_seconds, 5);
        assert_eq!(config.http.max_attempts, 4);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_env_optional_vars_default() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_CREDENTIALS_PATH, "creds.json");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config, AppConfig { credentials_path: "creds.json".into(), ..AppConfig::default() });
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, StreamGateError::Config(ref msg) if msg.starts_with(MISSING_VAR)));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_CREDENTIALS_PATH, "creds.json");
        std::env::set_var(ENV_REDIRECT_PORT, "not-a-port");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(StreamGateError::Config(_))));
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "credentials_path": "data/credentials.json",
            "redirect_port": 9200,
            "http": { "max_attempts": 5 }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("config from JSON file");
        assert_eq!(config.credentials_path, "data/credentials.json");
        assert_eq!(config.redirect_port, 9200);
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.http.timeout_seconds, 30);
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
credentials_path = "creds.json"
log_format = "json"

[eventsub]
websocket_url = "ws://localhost:9000/ws"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("config from TOML file");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.eventsub.websocket_url, "ws://localhost:9000/ws");
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/streamgate.json")));
        assert!(matches!(result, Err(StreamGateError::Config(_))));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("streamgate.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let result = parse_config(r#"{ "redirect_port": "#, &PathBuf::from("streamgate.json"));
        assert!(matches!(result, Err(StreamGateError::Config(_))));
    }
}
