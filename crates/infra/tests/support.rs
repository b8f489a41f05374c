//! Shared fixtures for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use streamgate_common::security::{SecretProtector, UserSecretStore};
use streamgate_common::testing::{RecordingSleeper, StaticKeySource};
use streamgate_core::{BrowserLauncher, TokenProvider};
use streamgate_domain::{PlatformId, Result};
use streamgate_infra::{CredentialStore, HttpClient};
use tempfile::TempDir;

/// Credential document in a temp dir, sealed with an in-memory key.
pub struct TestStore {
    pub store: Arc<CredentialStore>,
    _dir: TempDir,
}

impl TestStore {
    pub fn new(document: Value) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&document).expect("serialize"))
            .expect("write document");

        let protector: Arc<dyn SecretProtector> =
            Arc::new(UserSecretStore::new(Arc::new(StaticKeySource::random())));
        Self { store: Arc::new(CredentialStore::new(path, protector)), _dir: dir }
    }

    pub fn twitch(config: Value) -> Self {
        Self::new(json!({ "platforms": { "twitch": config } }))
    }

    /// Raw file contents, as written to disk.
    pub fn raw(&self) -> Value {
        let bytes = std::fs::read(self.store.path()).expect("read document");
        serde_json::from_slice(&bytes).expect("parse document")
    }
}

/// HTTP client whose backoff sleeps are recorded instead of awaited.
pub fn recording_http() -> (HttpClient, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let client = HttpClient::builder().sleeper(sleeper.clone()).build().expect("http client");
    (client, sleeper)
}

/// Token provider with fixed values.
pub struct StaticTokens {
    pub token: Option<String>,
    pub client_id: Option<String>,
}

impl StaticTokens {
    pub fn new(token: &str, client_id: &str) -> Arc<Self> {
        Arc::new(Self { token: Some(token.to_string()), client_id: Some(client_id.to_string()) })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self { token: None, client_id: None })
    }
}

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn access_token(&self, _platform: PlatformId, _force_refresh: bool) -> Option<String> {
        self.token.clone()
    }

    async fn client_id(&self, _platform: PlatformId) -> Option<String> {
        self.client_id.clone()
    }
}

/// Token provider that hands out `stale` until a refresh is forced, then
/// `fresh`. Counts forced refreshes.
pub struct RefreshingTokens {
    pub stale: String,
    pub fresh: String,
    forced: Mutex<usize>,
}

impl RefreshingTokens {
    pub fn new(stale: &str, fresh: &str) -> Arc<Self> {
        Arc::new(Self { stale: stale.to_string(), fresh: fresh.to_string(), forced: Mutex::new(0) })
    }

    pub fn forced_refreshes(&self) -> usize {
        *self.forced.lock()
    }
}

#[async_trait]
impl TokenProvider for RefreshingTokens {
    async fn access_token(&self, _platform: PlatformId, force_refresh: bool) -> Option<String> {
        if force_refresh {
            *self.forced.lock() += 1;
            Some(self.fresh.clone())
        } else {
            Some(self.stale.clone())
        }
    }

    async fn client_id(&self, _platform: PlatformId) -> Option<String> {
        Some("client-123".to_string())
    }
}

/// Browser that records every URL it was asked to open.
#[derive(Default)]
pub struct RecordingBrowser {
    urls: Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) -> Result<()> {
        self.urls.lock().push(url.to_string());
        Ok(())
    }
}

/// Value of `key` in the query string of `url`.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
