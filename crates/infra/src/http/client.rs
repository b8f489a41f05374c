use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use streamgate_common::resilience::{
    parse_retry_after, BackoffPolicy, RetryDecision, Sleeper, TokioSleeper,
};
use streamgate_domain::{HttpConfig, StreamGateError};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP client with built-in retry and timeout support.
///
/// Clones share one connection pool. Use [`HttpClient::isolated`] for calls
/// that attach per-call credentials.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    settings: ClientSettings,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

#[derive(Debug, Clone)]
struct ClientSettings {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl ClientSettings {
    fn build_client(&self) -> Result<ReqwestClient, StreamGateError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        if let Some(headers) = &self.default_headers {
            builder = builder.default_headers(headers.clone());
        }

        builder.build().map_err(|err| StreamGateError::from(InfraError::from(err)))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("settings", &self.settings)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, StreamGateError> {
        Self::builder().build()
    }

    /// Client configured from the `http` section of the app config.
    pub fn from_config(config: &HttpConfig) -> Result<Self, StreamGateError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .max_attempts(config.max_attempts)
            .build()
    }

    /// A client with the same settings and retry behaviour but its own
    /// connection pool.
    pub fn isolated(&self) -> Result<Self, StreamGateError> {
        Ok(Self {
            client: self.settings.build_client()?,
            settings: self.settings.clone(),
            policy: self.policy.clone(),
            sleeper: self.sleeper.clone(),
        })
    }

    #[must_use]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with the configured attempt limit.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, StreamGateError> {
        self.send_with_attempts(builder, self.policy.max_attempts()).await
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Retryable statuses and connection-level failures are retried while
    /// attempts remain. When attempts run out, a retryable status is
    /// returned as the final response and a transport failure as an error.
    pub async fn send_with_attempts(
        &self,
        builder: RequestBuilder,
        max_attempts: u32,
    ) -> Result<Response, StreamGateError> {
        let policy = self.policy.with_max_attempts(max_attempts);
        let mut attempt: u32 = 1;

        loop {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                StreamGateError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder
                .build()
                .map_err(|err| StreamGateError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_retry_after);

                    match policy.decide_status(status.as_u16(), attempt, retry_after) {
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                attempt,
                                %method,
                                %url,
                                status = status.as_u16(),
                                delay_ms = delay.as_millis() as u64,
                                "retryable HTTP status, backing off"
                            );
                            drop(response);
                            self.sleeper.sleep(delay).await;
                            attempt += 1;
                        }
                        RetryDecision::Stop => return Ok(response),
                    }
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    match policy.decide_transport_error(should_retry_error(&err), attempt) {
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                attempt,
                                %method,
                                %url,
                                delay_ms = delay.as_millis() as u64,
                                "HTTP transport failure, backing off"
                            );
                            self.sleeper.sleep(delay).await;
                            attempt += 1;
                        }
                        RetryDecision::Stop => {
                            let infra: InfraError = err.into();
                            return Err(StreamGateError::from(infra));
                        }
                    }
                }
            }
        }
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    policy: BackoffPolicy,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            policy: BackoffPolicy::default(),
            user_agent: None,
            default_headers: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy = self.policy.with_max_attempts(attempts);
        self
    }

    pub fn policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the wait between attempts.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, StreamGateError> {
        let settings = ClientSettings {
            timeout: self.timeout,
            user_agent: self.user_agent,
            default_headers: self.default_headers,
        };

        Ok(HttpClient {
            client: settings.build_client()?,
            settings,
            policy: self.policy,
            sleeper: self.sleeper,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;
    use streamgate_common::testing::RecordingSleeper;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with(sleeper: &Arc<RecordingSleeper>) -> HttpClient {
        HttpClient::builder().sleeper(sleeper.clone()).max_attempts(3).build().expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(&sleeper);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("POST"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                match attempts_clone.fetch_add(1, Ordering::SeqCst) {
                    0 => ResponseTemplate::new(500).insert_header("Retry-After", "0"),
                    1 => ResponseTemplate::new(502).insert_header("Retry-After", "0"),
                    _ => ResponseTemplate::new(204),
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(&sleeper);
        let response = client
            .send(client.request(Method::POST, server.uri()).body("{}"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(sleeper.delays(), vec![Duration::ZERO, Duration::ZERO]);
    }

    #[tokio::test]
    async fn honours_retry_after_seconds() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(429).insert_header("Retry-After", "7")
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(&sleeper);
        client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(sleeper.delays(), vec![Duration::from_secs(7)]);
    }

    /// Without a server hint the delay is `2^attempt` seconds plus jitter.
    #[tokio::test]
    async fn computed_backoff_grows_per_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(&sleeper);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let delays = sleeper.delays();
        assert_eq!(delays.len(), 2);
        assert!(delays[0] >= Duration::from_secs(2) && delays[0] < Duration::from_millis(2500));
        assert!(delays[1] >= Duration::from_secs(4) && delays[1] < Duration::from_millis(4500));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(&sleeper);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn single_attempt_returns_first_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = client_with(&sleeper);
        let response = client
            .send_with_attempts(client.request(Method::GET, server.uri()), 1)
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}", addr);

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = HttpClient::builder()
            .sleeper(sleeper.clone())
            .max_attempts(2)
            .build()
            .expect("http client");

        let result = client.send(client.request(Method::GET, &url)).await;
        match result {
            Err(StreamGateError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
        assert_eq!(sleeper.delays().len(), 1);
    }

    #[tokio::test]
    async fn isolated_client_keeps_retry_settings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let shared = HttpClient::builder()
            .sleeper(sleeper.clone())
            .max_attempts(2)
            .build()
            .expect("http client");
        let isolated = shared.isolated().expect("isolated client");

        let response =
            isolated.send(isolated.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(isolated.policy().max_attempts(), 2);
        assert_eq!(sleeper.delays().len(), 1);
    }
}
