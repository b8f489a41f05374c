//! EventSub websocket session
//!
//! One [`EventSubConnection::run`] call owns one socket: it waits for the
//! welcome frame, reconciles the subscription set against the announced
//! session, then reads frames in order until the socket closes. Reconnecting
//! is left to the caller.

use std::future::Future;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use streamgate_core::{
    DispatchAction, EventDispatcher, EventHandlers, ReconcileReport, SessionTracker,
    SubscriptionApi, SubscriptionReconciler,
};
use streamgate_domain::{
    default_twitch_subscriptions, EventSubConfig, EventSubscriptionDesired, Result,
    StreamGateError,
};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::errors::InfraError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the socket or the stream ended.
    Closed,
    /// The shutdown future resolved.
    Shutdown,
}

/// A single EventSub websocket session.
pub struct EventSubConnection {
    url: String,
    desired: Vec<EventSubscriptionDesired>,
    reconciler: SubscriptionReconciler,
    dispatcher: EventDispatcher,
}

impl EventSubConnection {
    /// Session keeping the default subscription set live for `broadcaster_id`.
    pub fn new(
        url: impl Into<String>,
        broadcaster_id: &str,
        api: Arc<dyn SubscriptionApi>,
        handlers: EventHandlers,
    ) -> Self {
        Self {
            url: url.into(),
            desired: default_twitch_subscriptions(broadcaster_id),
            reconciler: SubscriptionReconciler::new(api),
            dispatcher: EventDispatcher::new(Arc::new(SessionTracker::new()), handlers),
        }
    }

    /// Session against the configured `websocket_url`.
    pub fn from_config(
        config: &EventSubConfig,
        broadcaster_id: &str,
        api: Arc<dyn SubscriptionApi>,
        handlers: EventHandlers,
    ) -> Self {
        Self::new(config.websocket_url.as_str(), broadcaster_id, api, handlers)
    }

    /// Replace the subscription set.
    #[must_use]
    pub fn with_subscriptions(mut self, desired: Vec<EventSubscriptionDesired>) -> Self {
        self.desired = desired;
        self
    }

    /// Share an externally owned tracker.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<SessionTracker>) -> Self {
        let handlers = self.dispatcher.handlers().clone();
        self.dispatcher = EventDispatcher::new(tracker, handlers);
        self
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<SessionTracker> {
        self.dispatcher.tracker()
    }

    /// Run until the server closes the socket.
    ///
    /// # Errors
    /// See [`EventSubConnection::run_until`].
    pub async fn run(&self) -> Result<SessionEnd> {
        self.run_until(std::future::pending()).await
    }

    /// Run until the socket closes or `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error when the socket cannot be opened, the first frame is
    /// not a welcome, or the socket fails while reading.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> Result<SessionEnd> {
        let tracker = self.tracker().clone();
        tracker.connecting();

        info!(url = %self.url, "Connecting to EventSub");
        let mut socket = match connect_async(self.url.as_str()).await {
            Ok((socket, _response)) => socket,
            Err(err) => {
                tracker.disconnect();
                return Err(InfraError::from(err).into());
            }
        };
        tracker.awaiting_welcome();

        let outcome = self.session(&mut socket, shutdown).await;

        let _ = socket.close(None).await;
        let announced = tracker.session_id().is_some();
        tracker.disconnect();
        if announced {
            self.dispatcher.handlers().notify_connectivity(false);
        }
        match &outcome {
            Ok(end) => info!(end = ?end, "EventSub session ended"),
            Err(err) => warn!(error = %err, "EventSub session failed"),
        }
        outcome
    }

    async fn session(
        &self,
        socket: &mut Socket,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SessionEnd> {
        tokio::pin!(shutdown);

        let first = tokio::select! {
            frame = next_text(socket) => frame?,
            () = &mut shutdown => return Ok(SessionEnd::Shutdown),
        };
        let Some(first) = first else {
            return Err(StreamGateError::Protocol("socket closed before welcome".into()));
        };
        match self.dispatcher.dispatch(&first) {
            DispatchAction::Reconcile { session_id } => {
                self.dispatcher.handlers().notify_connectivity(true);
                self.reconcile(&session_id).await;
            }
            other => {
                return Err(StreamGateError::Protocol(format!(
                    "expected session_welcome as first frame, got {other:?}"
                )));
            }
        }

        loop {
            let frame = tokio::select! {
                frame = next_text(socket) => frame?,
                () = &mut shutdown => return Ok(SessionEnd::Shutdown),
            };
            let Some(frame) = frame else {
                return Ok(SessionEnd::Closed);
            };

            if let DispatchAction::Reconcile { session_id } = self.dispatcher.dispatch(&frame) {
                self.reconcile(&session_id).await;
            }
        }
    }

    async fn reconcile(&self, session_id: &str) -> ReconcileReport {
        let report = self.reconciler.reconcile(&self.desired, session_id).await;
        for failure in report.failures() {
            warn!(
                subscription_type = %failure.event_type,
                session_id = %session_id,
                "Subscription not active for this session"
            );
        }
        self.tracker().activate();
        report
    }
}

/// Next text frame, answering pings on the way. `None` once the socket closes.
async fn next_text(socket: &mut Socket) -> Result<Option<String>> {
    while let Some(message) = socket.next().await {
        match message.map_err(InfraError::from)? {
            Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
            Message::Ping(payload) => {
                socket.send(Message::Pong(payload)).await.map_err(InfraError::from)?;
            }
            Message::Close(frame) => {
                debug!(frame = ?frame, "EventSub socket closed by server");
                return Ok(None);
            }
            Message::Binary(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
    Ok(None)
}
