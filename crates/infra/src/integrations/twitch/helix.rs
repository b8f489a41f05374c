//! Authenticated access to the Helix REST API

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use streamgate_core::TokenProvider;
use streamgate_domain::{EventSubConfig, PlatformId, Result, StreamGateError};
use tracing::warn;

use crate::errors::status_error;
use crate::http::HttpClient;

/// Helix base URL plus the credentials every call carries.
///
/// Holds its own connection pool so bearer headers never leak into shared
/// clients.
#[derive(Clone)]
pub struct HelixApi {
    http: HttpClient,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
}

impl std::fmt::Debug for HelixApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelixApi").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl HelixApi {
    /// # Errors
    /// Returns an error when the isolated HTTP client cannot be built.
    pub fn new(
        http: &HttpClient,
        tokens: Arc<dyn TokenProvider>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            http: http.isolated()?,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Helix client rooted at the configured `api_base_url`.
    ///
    /// # Errors
    /// Returns an error when the isolated HTTP client cannot be built.
    pub fn from_config(
        http: &HttpClient,
        tokens: Arc<dyn TokenProvider>,
        config: &EventSubConfig,
    ) -> Result<Self> {
        Self::new(http, tokens, config.api_base_url.as_str())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build with `prepare` and send. A 401 forces one token refresh and a
    /// single resend; whatever the second attempt returns is handed back.
    ///
    /// # Errors
    /// Returns `Auth` when no token is available and transport errors after
    /// retries are exhausted.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        prepare: impl Fn(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response> {
        let request = self.authorized(method.clone(), path, false).await?;
        let response = self.send(prepare(request)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(path = %path, "Helix rejected the access token, refreshing once");
        let request = self.authorized(method, path, true).await?;
        self.send(prepare(request)).await
    }

    /// Request to `path` with `Authorization` and `Client-Id` attached.
    async fn authorized(
        &self,
        method: Method,
        path: &str,
        force_refresh: bool,
    ) -> Result<RequestBuilder> {
        let token = self
            .tokens
            .access_token(PlatformId::Twitch, force_refresh)
            .await
            .ok_or_else(|| StreamGateError::Auth("no Twitch access token stored".into()))?;

        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token);
        if let Some(client_id) = self.tokens.client_id(PlatformId::Twitch).await {
            builder = builder.header("Client-Id", client_id);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        self.http.send(builder).await
    }
}

/// Map a non-success response into a domain error carrying its body.
pub(crate) async fn error_for_response(response: Response) -> StreamGateError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    status_error(status, body.trim())
}
