//! OAuth2 authorization-code + PKCE orchestration for streaming platforms.
//!
//! The coordinator resolves client registration from the credential store,
//! drives one loopback authorization per call to
//! [`OAuthCoordinator::authenticate`], exchanges the code through the retry
//! transport and persists tokens. It also refreshes tokens on demand and
//! serves them to collaborators through [`TokenProvider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use streamgate_common::auth::{OAuthClientConfig, PkceChallenge, TokenResponse};
use streamgate_core::{AuthObserver, BrowserLauncher, TokenProvider};
use streamgate_domain::constants::{
    CLIENT_ID_PLACEHOLDER_PREFIXES, DEFAULT_REDIRECT_PATH, DEFAULT_REDIRECT_PORT,
    OAUTH_CALLBACK_TIMEOUT_SECS,
};
use streamgate_domain::{
    AuthFailure, AuthFailureKind, AuthFlowPhase, AuthSuccess, PlatformCredential, PlatformId,
    RefreshOutcome,
};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

use super::browser::OpenBrowserLauncher;
use super::callback::CallbackServer;
use super::providers::{client_config, resolve_token_url};
use crate::config::CredentialStore;
use crate::http::HttpClient;

/// Coordinates authorization, refresh and token lookup for every platform.
pub struct OAuthCoordinator {
    store: Arc<CredentialStore>,
    http: HttpClient,
    browser: Arc<dyn BrowserLauncher>,
    observer: Option<Arc<dyn AuthObserver>>,
    redirect_port: u16,
    callback_timeout: Duration,
}

impl OAuthCoordinator {
    pub fn new(store: Arc<CredentialStore>, http: HttpClient) -> Self {
        Self {
            store,
            http,
            browser: Arc::new(OpenBrowserLauncher),
            observer: None,
            redirect_port: DEFAULT_REDIRECT_PORT,
            callback_timeout: Duration::from_secs(OAUTH_CALLBACK_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AuthObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Port used when the platform has no `redirect_uri` configured.
    #[must_use]
    pub fn with_redirect_port(mut self, port: u16) -> Self {
        self.redirect_port = port;
        self
    }

    #[must_use]
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Start an authorization for `platform`.
    ///
    /// Arguments override the configured client id and secret. On success
    /// the browser has been asked to open the authorization URL and the
    /// listener is waiting; await the returned handle for the result.
    ///
    /// # Errors
    /// Fails fast with `NotConfigured` when no usable client id exists, or
    /// `Setup` when the listener cannot be started. No network call is made
    /// in either case.
    pub async fn authenticate(
        &self,
        platform: PlatformId,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<PendingAuthorization, AuthFailure> {
        match self.start(platform, client_id, client_secret).await {
            Ok(pending) => Ok(pending),
            Err(failure) => {
                warn!(platform = %platform, kind = ?failure.kind, detail = %failure.detail, "Authorization could not start");
                if let Some(observer) = &self.observer {
                    observer.on_failed(&failure);
                }
                Err(failure)
            }
        }
    }

    async fn start(
        &self,
        platform: PlatformId,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<PendingAuthorization, AuthFailure> {
        let config = self.store.get_platform_config(platform);
        let stored = PlatformCredential::from_config(platform, &config);

        let client_id = client_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .or(stored.client_id)
            .filter(|id| !is_placeholder(id))
            .ok_or_else(|| {
                AuthFailure::new(
                    platform,
                    AuthFailureKind::NotConfigured,
                    format!("no client id configured for {platform}"),
                )
            })?;
        let client_secret =
            client_secret.filter(|s| !s.is_empty()).map(String::from).or(stored.client_secret);

        let client = client_config(platform, &config, client_id, client_secret, self.redirect_port)
            .ok_or_else(|| {
                AuthFailure::new(
                    platform,
                    AuthFailureKind::NotConfigured,
                    format!("no OAuth endpoints known for {platform}"),
                )
            })?;

        let (port, path) = redirect_target(&client.redirect_uri).ok_or_else(|| {
            AuthFailure::new(
                platform,
                AuthFailureKind::Setup,
                format!("invalid redirect URI '{}'", client.redirect_uri),
            )
        })?;

        let challenge = PkceChallenge::generate();
        let server = CallbackServer::bind(port, &path, challenge.state.clone())
            .await
            .map_err(|e| AuthFailure::new(platform, AuthFailureKind::Setup, e.to_string()))?;

        let authorization_url = client.authorization_url(&challenge);
        info!(platform = %platform, port, "Opening browser for authorization");
        if let Err(err) = self.browser.open(&authorization_url) {
            warn!(platform = %platform, error = %err, "Could not open browser; URL must be opened manually");
        }

        let (phase_tx, phase_rx) = watch::channel(AuthFlowPhase::AwaitingCallback);
        let (result_tx, result_rx) = oneshot::channel();

        let flow = FlowContext {
            platform,
            client,
            code_verifier: challenge.code_verifier,
            store: self.store.clone(),
            http: self.http.clone(),
            observer: self.observer.clone(),
            timeout: self.callback_timeout,
        };

        tokio::spawn(async move {
            let outcome = flow.run(server, &phase_tx).await;
            let _ = result_tx.send(outcome);
        });

        Ok(PendingAuthorization { platform, authorization_url, phase: phase_rx, result: result_rx })
    }

    /// Current access token, refreshed when forced or close to expiry.
    ///
    /// A failed refresh falls back to the stored token. `None` means no
    /// token was ever stored.
    pub async fn get_access_token(&self, platform: PlatformId, force_refresh: bool) -> Option<String> {
        let credential = self.store.platform_credential(platform);
        let current = credential.access_token.clone()?;

        let now = chrono::Utc::now().timestamp();
        if !force_refresh && credential.is_fresh_at(now) {
            return Some(current);
        }

        debug!(platform = %platform, force_refresh, "Refreshing access token");
        match self.refresh_token(platform).await {
            RefreshOutcome::Refreshed { access_token } => Some(access_token),
            outcome => {
                warn!(platform = %platform, outcome = ?outcome, "Token refresh failed; using stored token");
                Some(current)
            }
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Every failure is reported in the returned outcome.
    pub async fn refresh_token(&self, platform: PlatformId) -> RefreshOutcome {
        let config = self.store.get_platform_config(platform);
        let credential = PlatformCredential::from_config(platform, &config);

        let Some(refresh_token) = credential.refresh_token else {
            return RefreshOutcome::MissingRefreshToken;
        };
        let Some(token_url) = resolve_token_url(platform, &config) else {
            return RefreshOutcome::MissingTokenUrl;
        };

        let client = OAuthClientConfig {
            client_id: credential.client_id.unwrap_or_default(),
            client_secret: credential.client_secret,
            redirect_uri: String::new(),
            authorize_url: String::new(),
            token_url,
            scopes: Vec::new(),
            extra_authorize_params: Vec::new(),
        };

        let request =
            self.http.request(Method::POST, &client.token_url).form(&client.refresh_form(&refresh_token));
        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(err) => return RefreshOutcome::Failed(err.to_string()),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return RefreshOutcome::Failed(format!("failed to read token response: {err}")),
        };
        if !status.is_success() {
            warn!(platform = %platform, status = status.as_u16(), "Refresh rejected by token endpoint");
            return RefreshOutcome::Rejected { status: status.as_u16(), body };
        }

        let tokens = match TokenResponse::from_body(&body) {
            Ok(tokens) => tokens,
            Err(err) => return RefreshOutcome::InvalidResponse(err),
        };

        let issued_at = chrono::Utc::now().timestamp();
        if let Err(err) = self.store.store_tokens(platform, &tokens, issued_at) {
            return RefreshOutcome::Failed(format!("failed to persist refreshed tokens: {err}"));
        }

        info!(platform = %platform, expires_in = ?tokens.expires_in, "Access token refreshed");
        RefreshOutcome::Refreshed { access_token: tokens.access_token }
    }

    /// Remove stored tokens for `platform`.
    ///
    /// # Errors
    /// Returns an error when the credential document cannot be written.
    pub fn logout(&self, platform: PlatformId) -> streamgate_domain::Result<()> {
        self.store.clear_tokens(platform)?;
        info!(platform = %platform, "Logged out");
        Ok(())
    }

    #[must_use]
    pub fn is_authenticated(&self, platform: PlatformId) -> bool {
        self.store.platform_credential(platform).has_access_token()
    }
}

#[async_trait]
impl TokenProvider for OAuthCoordinator {
    async fn access_token(&self, platform: PlatformId, force_refresh: bool) -> Option<String> {
        self.get_access_token(platform, force_refresh).await
    }

    async fn client_id(&self, platform: PlatformId) -> Option<String> {
        self.store.platform_credential(platform).client_id
    }
}

/// Handle to an authorization in progress.
pub struct PendingAuthorization {
    platform: PlatformId,
    authorization_url: String,
    phase: watch::Receiver<AuthFlowPhase>,
    result: oneshot::Receiver<Result<AuthSuccess, AuthFailure>>,
}

impl std::fmt::Debug for PendingAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAuthorization")
            .field("platform", &self.platform)
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl PendingAuthorization {
    #[must_use]
    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    /// URL the browser was asked to open.
    #[must_use]
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    #[must_use]
    pub fn phase(&self) -> AuthFlowPhase {
        *self.phase.borrow()
    }

    /// Receiver that observes every phase change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthFlowPhase> {
        self.phase.clone()
    }

    /// Wait until the attempt completes or fails.
    ///
    /// # Errors
    /// Returns the [`AuthFailure`] that ended the attempt.
    pub async fn wait(self) -> Result<AuthSuccess, AuthFailure> {
        let platform = self.platform;
        self.result.await.unwrap_or_else(|_| {
            Err(AuthFailure::new(
                platform,
                AuthFailureKind::Setup,
                "authorization task ended without a result",
            ))
        })
    }
}

/// Everything the spawned flow task owns.
struct FlowContext {
    platform: PlatformId,
    client: OAuthClientConfig,
    code_verifier: String,
    store: Arc<CredentialStore>,
    http: HttpClient,
    observer: Option<Arc<dyn AuthObserver>>,
    timeout: Duration,
}

impl FlowContext {
    async fn run(
        self,
        server: CallbackServer,
        phase: &watch::Sender<AuthFlowPhase>,
    ) -> Result<AuthSuccess, AuthFailure> {
        let outcome = self.complete(server, phase).await;

        match &outcome {
            Ok(success) => {
                phase.send_replace(AuthFlowPhase::Completed);
                info!(platform = %self.platform, "Authorization completed");
                if let Some(observer) = &self.observer {
                    observer.on_completed(success);
                }
            }
            Err(failure) => {
                phase.send_replace(AuthFlowPhase::Failed);
                warn!(
                    platform = %self.platform,
                    kind = ?failure.kind,
                    detail = %failure.detail,
                    "Authorization failed"
                );
                if let Some(observer) = &self.observer {
                    observer.on_failed(failure);
                }
            }
        }
        outcome
    }

    async fn complete(
        &self,
        server: CallbackServer,
        phase: &watch::Sender<AuthFlowPhase>,
    ) -> Result<AuthSuccess, AuthFailure> {
        let platform = self.platform;
        let code = server
            .wait(self.timeout)
            .await
            .map_err(|e| AuthFailure::new(platform, e.kind, e.detail))?;

        phase.send_replace(AuthFlowPhase::Exchanging);
        debug!(platform = %platform, "Exchanging authorization code");

        let form = self.client.code_exchange_form(&code, &self.code_verifier);
        let request = self.http.request(Method::POST, &self.client.token_url).form(&form);
        let response = self.http.send(request).await.map_err(|e| {
            AuthFailure::new(platform, AuthFailureKind::ExchangeFailed, e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AuthFailure::new(
                platform,
                AuthFailureKind::ExchangeFailed,
                format!("failed to read token response: {e}"),
            )
        })?;

        let tokens = TokenResponse::from_body(&body).map_err(|e| {
            AuthFailure::new(
                platform,
                AuthFailureKind::ExchangeFailed,
                format!("token endpoint answered {status}: {e}"),
            )
            .with_raw_body(body.clone())
        })?;

        let issued_at = chrono::Utc::now().timestamp();
        self.store.store_tokens(platform, &tokens, issued_at).map_err(|e| {
            AuthFailure::new(platform, AuthFailureKind::Persistence, e.to_string())
        })?;

        Ok(AuthSuccess {
            platform,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            scope: tokens.scope,
            issued_at,
        })
    }
}

fn is_placeholder(client_id: &str) -> bool {
    CLIENT_ID_PLACEHOLDER_PREFIXES.iter().any(|prefix| client_id.starts_with(prefix))
}

/// Port and path the loopback listener must serve for `redirect_uri`.
fn redirect_target(redirect_uri: &str) -> Option<(u16, String)> {
    let url = Url::parse(redirect_uri).ok()?;
    let port = url.port_or_known_default()?;
    let path = match url.path() {
        "" | "/" => DEFAULT_REDIRECT_PATH.to_string(),
        path => path.to_string(),
    };
    Some((port, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_placeholder_client_ids() {
        assert!(is_placeholder("YOUR_CLIENT_ID"));
        assert!(is_placeholder("your_client_id"));
        assert!(is_placeholder("<client id>"));
        assert!(is_placeholder("changeme"));
        assert!(!is_placeholder("abc123"));
    }

    #[test]
    fn redirect_target_reads_port_and_path() {
        assert_eq!(
            redirect_target("http://localhost:8889/callback"),
            Some((8889, "/callback".to_string()))
        );
        assert_eq!(redirect_target("http://localhost:9000"), Some((9000, "/callback".to_string())));
        assert_eq!(redirect_target("http://localhost/auth"), Some((80, "/auth".to_string())));
        assert_eq!(redirect_target("not a url"), None);
    }
}
