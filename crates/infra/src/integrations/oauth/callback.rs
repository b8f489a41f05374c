//! Loopback HTTP server that receives the OAuth redirect.
//!
//! The server answers exactly one request on the callback path. Its query is
//! validated against the expected `state`, a static page is returned to the
//! browser, and the outcome is handed to [`CallbackServer::wait`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use streamgate_common::auth::validate_state;
use streamgate_domain::{AuthFailureKind, StreamGateError};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::errors::InfraError;

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Authorization Successful</h1><p>You can close this window and return to StreamGate.</p></body>
</html>"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body><h1>Authorization Failed</h1><p>Invalid or unexpected callback parameters. Please try again from StreamGate.</p></body>
</html>"#;

/// Why a callback did not yield a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackError {
    pub kind: AuthFailureKind,
    pub detail: String,
}

impl CallbackError {
    fn new(kind: AuthFailureKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }
}

type CallbackResult = Result<String, CallbackError>;

struct CallbackState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackResult>>>,
}

/// Single-use loopback listener.
pub struct CallbackServer {
    addr: SocketAddr,
    outcome_rx: oneshot::Receiver<CallbackResult>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:port` and serve `path`. Port 0 picks a free port.
    ///
    /// # Errors
    /// Returns an error when the port cannot be bound.
    pub async fn bind(
        port: u16,
        path: &str,
        expected_state: String,
    ) -> Result<Self, StreamGateError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|err| {
            StreamGateError::Network(format!("failed to bind OAuth loopback server on port {port}: {err}"))
        })?;
        let addr = listener.local_addr().map_err(|err| StreamGateError::from(InfraError::from(err)))?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let state = Arc::new(CallbackState { expected_state, sender: Mutex::new(Some(outcome_tx)) });

        let app = Router::new().route(path, get(handle_oauth_callback)).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("OAuth callback server error: {}", err);
            }
        });

        debug!(%addr, "OAuth callback server listening");

        Ok(Self { addr, outcome_rx, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the callback, then shut the listener down.
    ///
    /// # Errors
    /// Returns a [`CallbackError`] on timeout or when the callback was
    /// rejected.
    pub async fn wait(mut self, timeout: Duration) -> CallbackResult {
        let outcome = match tokio::time::timeout(timeout, &mut self.outcome_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(CallbackError::new(
                AuthFailureKind::Setup,
                "callback server stopped before a callback arrived",
            )),
            Err(_) => Err(CallbackError::new(
                AuthFailureKind::Timeout,
                format!("no OAuth callback within {} seconds", timeout.as_secs()),
            )),
        };

        self.shutdown().await;
        outcome
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    error!("OAuth callback server panicked: {err}");
                }
            }
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_oauth_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let Some(sender) = state.sender.lock().take() else {
        warn!("Ignoring repeated OAuth callback");
        return Html(FAILURE_PAGE);
    };

    let outcome = evaluate(&state.expected_state, &params);
    let page = if outcome.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
    let _ = sender.send(outcome);
    Html(page)
}

fn evaluate(expected_state: &str, params: &HashMap<String, String>) -> CallbackResult {
    if let Some(error) = params.get("error") {
        let description = params.get("error_description").map(String::as_str).unwrap_or_default();
        return Err(CallbackError::new(
            AuthFailureKind::Denied,
            format!("provider returned error '{error}' {description}").trim_end().to_string(),
        ));
    }

    let received_state = params.get("state").map(String::as_str).unwrap_or_default();
    if !validate_state(expected_state, received_state) {
        return Err(CallbackError::new(AuthFailureKind::StateMismatch, "callback state mismatch"));
    }

    match params.get("code").filter(|code| !code.is_empty()) {
        Some(code) => Ok(code.clone()),
        None => Err(CallbackError::new(AuthFailureKind::MissingCode, "callback carried no code")),
    }
}
