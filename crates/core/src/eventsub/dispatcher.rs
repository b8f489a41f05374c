//! Routes websocket frames to session state and consumer callbacks

use std::sync::Arc;

use streamgate_domain::constants::REDEMPTION_EVENT_MARKER;
use streamgate_domain::EventSubMessage;
use tracing::{debug, info, warn};

use super::handlers::EventHandlers;
use super::session::SessionTracker;

/// What the connection loop must do after a frame was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// A new session was announced; subscriptions must be reconciled for it.
    Reconcile { session_id: String },
    /// A notification was handed to the registered handlers.
    Delivered { subscription_type: String },
    /// Nothing further to do.
    Ignored,
}

/// Parses frames and applies them, strictly in the order received.
pub struct EventDispatcher {
    tracker: Arc<SessionTracker>,
    handlers: EventHandlers,
}

impl EventDispatcher {
    pub fn new(tracker: Arc<SessionTracker>, handlers: EventHandlers) -> Self {
        Self { tracker, handlers }
    }

    #[must_use]
    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<SessionTracker> {
        &self.tracker
    }

    pub fn dispatch(&self, frame: &str) -> DispatchAction {
        let message = match EventSubMessage::parse(frame) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "Dropping malformed EventSub frame");
                return DispatchAction::Ignored;
            }
        };

        match message {
            EventSubMessage::SessionWelcome { session_id, keepalive_timeout_seconds } => {
                info!(
                    session_id = %session_id,
                    keepalive_timeout_seconds = ?keepalive_timeout_seconds,
                    "EventSub welcome received"
                );
                self.tracker.welcome(&session_id);
                DispatchAction::Reconcile { session_id }
            }
            EventSubMessage::Keepalive => DispatchAction::Ignored,
            EventSubMessage::Notification { subscription_type, event } => {
                debug!(subscription_type = %subscription_type, "EventSub notification");
                self.handlers.emit_event(&subscription_type, &event);
                if is_redemption(&subscription_type) {
                    self.handlers.emit_redemption(&event);
                }
                DispatchAction::Delivered { subscription_type }
            }
            EventSubMessage::Reconnect { reconnect_url } => {
                info!(reconnect_url = ?reconnect_url, "EventSub server requested reconnect");
                DispatchAction::Ignored
            }
            EventSubMessage::Revocation { subscription_type, status } => {
                warn!(
                    subscription_type = %subscription_type,
                    status = %status,
                    "EventSub subscription revoked"
                );
                DispatchAction::Ignored
            }
            EventSubMessage::Unknown { message_type } => {
                debug!(message_type = %message_type, "Ignoring unknown EventSub message type");
                DispatchAction::Ignored
            }
        }
    }
}

fn is_redemption(subscription_type: &str) -> bool {
    subscription_type.contains(REDEMPTION_EVENT_MARKER)
}
