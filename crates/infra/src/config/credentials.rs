//! Credential document persisted as JSON
//!
//! Layout is `{"platforms": {"<id>": {...}}}`. Sensitive fields under
//! `platforms.*` are sealed with a [`SecretProtector`] before they reach the
//! disk, and unsealed when read back. Every read goes to the file so that
//! edits made by other processes are picked up.
//!
//! A single non-reentrant lock serializes all file access; helpers below take
//! the guarded view by reference and never lock again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use streamgate_common::auth::TokenResponse;
use streamgate_common::security::{is_protected, SecretProtector};
use streamgate_domain::constants::{
    KEY_BOT_TOKEN_TIMESTAMP, KEY_EXPIRES_IN, KEY_OAUTH_TOKEN, KEY_REFRESH_TOKEN,
    KEY_STREAMER_TOKEN_TIMESTAMP, KEY_TOKEN_TIMESTAMP, PLATFORMS_KEY, SENSITIVE_FIELDS,
    USER_ID_FALLBACK_KEYS,
};
use streamgate_domain::{PlatformCredential, PlatformId, Result, StreamGateError};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// File-backed credential store.
pub struct CredentialStore {
    path: PathBuf,
    protector: Arc<dyn SecretProtector>,
    /// Decrypted copy of the document as last read or written.
    view: Mutex<Value>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").field("path", &self.path).finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, protector: Arc<dyn SecretProtector>) -> Self {
        Self { path: path.into(), protector, view: Mutex::new(empty_document()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file and keep a decrypted copy in memory. The file itself is
    /// left as is.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Value> {
        let mut view = self.view.lock();
        let document = self.read_unsealed()?;
        *view = document.clone();
        debug!(path = %self.path.display(), "Credential document loaded");
        Ok(document)
    }

    /// The in-memory copy from the last read or write.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.view.lock().clone()
    }

    /// Seal any plaintext sensitive fields in the file and write it back.
    /// Values that are already sealed are not touched.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, sealed or written.
    pub fn save(&self) -> Result<()> {
        let mut view = self.view.lock();
        let raw = self.read_raw()?;
        self.write_sealed(raw)?;
        *view = self.read_unsealed()?;
        Ok(())
    }

    /// Value at a dot-separated path, or `default` when absent.
    pub fn get(&self, path: &str, default: Value) -> Value {
        let mut view = self.view.lock();
        match self.read_unsealed() {
            Ok(document) => {
                let found = lookup(&document, path).cloned();
                *view = document;
                found.unwrap_or(default)
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read credential document");
                default
            }
        }
    }

    /// Set the value at a dot-separated path, creating intermediate objects.
    ///
    /// # Errors
    /// Returns an error when the path is empty or the document cannot be
    /// read, sealed or written.
    pub fn set(&self, path: &str, value: Value) -> Result<()> {
        if path.split('.').any(str::is_empty) {
            return Err(StreamGateError::InvalidInput(format!("invalid document path '{path}'")));
        }
        self.update(|document| assign(document, path, value))
    }

    /// The decrypted settings object of one platform (empty when missing).
    pub fn get_platform_config(&self, platform: PlatformId) -> Map<String, Value> {
        match self.get(&platform_path(platform), Value::Null) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// # Errors
    /// Returns an error when the document cannot be read, sealed or written.
    pub fn set_platform_config(&self, platform: PlatformId, key: &str, value: Value) -> Result<()> {
        self.update(|document| {
            platform_entry(document, platform)?.insert(key.to_string(), value);
            Ok(())
        })
    }

    /// Remove one key of a platform; returns whether it existed.
    ///
    /// # Errors
    /// Returns an error when the document cannot be read, sealed or written.
    pub fn remove_platform_key(&self, platform: PlatformId, key: &str) -> Result<bool> {
        let mut removed = false;
        self.update(|document| {
            removed = platform_entry(document, platform)?.remove(key).is_some();
            Ok(())
        })?;
        Ok(removed)
    }

    /// User id for `account_type`, falling back through the generic keys.
    pub fn get_platform_user_id(
        &self,
        platform: PlatformId,
        account_type: &str,
        default: &str,
    ) -> String {
        let config = self.get_platform_config(platform);
        let specific = format!("{account_type}_user_id");

        std::iter::once(specific.as_str())
            .chain(USER_ID_FALLBACK_KEYS.iter().copied())
            .find_map(|key| config.get(key).and_then(value_as_id))
            .unwrap_or_else(|| default.to_string())
    }

    /// Typed view of one platform's credentials.
    pub fn platform_credential(&self, platform: PlatformId) -> PlatformCredential {
        PlatformCredential::from_config(platform, &self.get_platform_config(platform))
    }

    /// Persist a token response as one read-modify-write.
    ///
    /// # Errors
    /// Returns an error when the document cannot be read, sealed or written.
    pub fn store_tokens(
        &self,
        platform: PlatformId,
        tokens: &TokenResponse,
        issued_at: i64,
    ) -> Result<()> {
        self.update(|document| {
            let entry = platform_entry(document, platform)?;
            entry.insert(KEY_OAUTH_TOKEN.into(), Value::String(tokens.access_token.clone()));
            if let Some(refresh) = tokens.refresh_token.as_ref().filter(|r| !r.is_empty()) {
                entry.insert(KEY_REFRESH_TOKEN.into(), Value::String(refresh.clone()));
            }
            if let Some(expires_in) = tokens.expires_in {
                entry.insert(KEY_EXPIRES_IN.into(), Value::from(expires_in));
            }
            for key in [KEY_TOKEN_TIMESTAMP, KEY_BOT_TOKEN_TIMESTAMP, KEY_STREAMER_TOKEN_TIMESTAMP] {
                entry.insert(key.into(), Value::from(issued_at));
            }
            Ok(())
        })?;
        debug!(platform = %platform, "Stored platform tokens");
        Ok(())
    }

    /// Drop stored tokens and their timestamps.
    ///
    /// # Errors
    /// Returns an error when the document cannot be read, sealed or written.
    pub fn clear_tokens(&self, platform: PlatformId) -> Result<()> {
        self.update(|document| {
            let entry = platform_entry(document, platform)?;
            for key in [
                KEY_OAUTH_TOKEN,
                KEY_REFRESH_TOKEN,
                KEY_EXPIRES_IN,
                KEY_TOKEN_TIMESTAMP,
                KEY_BOT_TOKEN_TIMESTAMP,
                KEY_STREAMER_TOKEN_TIMESTAMP,
            ] {
                entry.remove(key);
            }
            Ok(())
        })
    }

    /// Read-modify-write under the lock. The closure sees the raw document
    /// (sealed values still sealed); new plaintext secrets are sealed on write.
    fn update(&self, apply: impl FnOnce(&mut Value) -> Result<()>) -> Result<()> {
        let mut view = self.view.lock();
        let mut document = self.read_raw()?;
        apply(&mut document)?;
        self.write_sealed(document)?;
        *view = self.read_unsealed()?;
        Ok(())
    }

    fn read_raw(&self) -> Result<Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(empty_document()),
            Err(err) => return Err(InfraError::from(err).into()),
        };
        if contents.trim().is_empty() {
            return Ok(empty_document());
        }
        let document: Value =
            serde_json::from_str(&contents).map_err(|e| StreamGateError::from(InfraError::from(e)))?;
        if !document.is_object() {
            return Err(StreamGateError::Storage(
                "credential document must be a JSON object".into(),
            ));
        }
        Ok(document)
    }

    fn read_unsealed(&self) -> Result<Value> {
        let mut document = self.read_raw()?;
        for_each_platform(&mut document, |_, entry| {
            for value in entry.values_mut() {
                if let Value::String(text) = value {
                    if is_protected(text) {
                        *text = self.protector.unprotect(text);
                    }
                }
            }
            Ok(())
        })?;
        Ok(document)
    }

    fn write_sealed(&self, mut document: Value) -> Result<()> {
        for_each_platform(&mut document, |platform, entry| {
            for field in SENSITIVE_FIELDS {
                if let Some(Value::String(text)) = entry.get_mut(*field) {
                    if text.is_empty() || is_protected(text) {
                        continue;
                    }
                    *text = self.protector.protect(text).map_err(|e| {
                        StreamGateError::Security(format!(
                            "failed to seal {platform}.{field}: {e}"
                        ))
                    })?;
                }
            }
            Ok(())
        })?;
        self.write_atomic(&document)
    }

    fn write_atomic(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(InfraError::from)?;
        }
        let contents = serde_json::to_string_pretty(document)
            .map_err(|e| StreamGateError::from(InfraError::from(e)))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, contents).map_err(InfraError::from)?;
        std::fs::rename(&tmp_path, &self.path).map_err(InfraError::from)?;
        Ok(())
    }
}

fn empty_document() -> Value {
    Value::Object(Map::new())
}

fn platform_path(platform: PlatformId) -> String {
    format!("{PLATFORMS_KEY}.{platform}")
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |node, key| node.as_object()?.get(key))
}

fn root_object(document: &mut Value) -> Result<&mut Map<String, Value>> {
    document
        .as_object_mut()
        .ok_or_else(|| StreamGateError::Storage("credential document must be a JSON object".into()))
}

/// Object stored under `key`, replacing any non-object value.
fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>> {
    let slot = map.entry(key.to_string()).or_insert_with(empty_document);
    if !slot.is_object() {
        *slot = empty_document();
    }
    slot.as_object_mut()
        .ok_or_else(|| StreamGateError::Internal(format!("'{key}' is not an object")))
}

fn assign(document: &mut Value, path: &str, value: Value) -> Result<()> {
    let keys: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = keys.split_last() else {
        return Ok(());
    };
    let mut node = root_object(document)?;
    for key in parents {
        node = object_entry(node, key)?;
    }
    node.insert((*last).to_string(), value);
    Ok(())
}

fn platform_entry(document: &mut Value, platform: PlatformId) -> Result<&mut Map<String, Value>> {
    let platforms = object_entry(root_object(document)?, PLATFORMS_KEY)?;
    object_entry(platforms, platform.as_str())
}

fn for_each_platform(
    document: &mut Value,
    mut visit: impl FnMut(&str, &mut Map<String, Value>) -> Result<()>,
) -> Result<()> {
    let Some(Value::Object(platforms)) = document.get_mut(PLATFORMS_KEY) else {
        return Ok(());
    };
    for (name, entry) in platforms.iter_mut() {
        if let Value::Object(entry) = entry {
            visit(name, entry)?;
        }
    }
    Ok(())
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
