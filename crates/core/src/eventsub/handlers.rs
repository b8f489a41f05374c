//! Callback registration for EventSub consumers

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

type ConnectivityCallback = Arc<dyn Fn(bool) + Send + Sync>;
type EventCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;
type RedemptionCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Registered callbacks. Every slot is optional.
///
/// Callbacks registered for a specific subscription type run before the
/// catch-all [`EventHandlers::on_event`] callback.
///
/// ```
/// use streamgate_core::eventsub::EventHandlers;
///
/// let handlers = EventHandlers::new()
///     .on_connectivity_changed(|connected| assert!(connected))
///     .on_event(|kind, _event| assert_eq!(kind, "channel.raid"));
/// handlers.notify_connectivity(true);
/// handlers.emit_event("channel.raid", &serde_json::json!({}));
/// ```
#[derive(Clone, Default)]
pub struct EventHandlers {
    connectivity: Option<ConnectivityCallback>,
    event: Option<EventCallback>,
    typed: HashMap<String, Vec<EventCallback>>,
    redemption: Option<RedemptionCallback>,
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("connectivity", &self.connectivity.is_some())
            .field("event", &self.event.is_some())
            .field("typed", &self.typed.keys().collect::<Vec<_>>())
            .field("redemption", &self.redemption.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with `true` once a session is established and `false` when it
    /// is lost.
    #[must_use]
    pub fn on_connectivity_changed(
        mut self,
        callback: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.connectivity = Some(Arc::new(callback));
        self
    }

    /// Called for every notification with its subscription type and event body.
    #[must_use]
    pub fn on_event(mut self, callback: impl Fn(&str, &Value) + Send + Sync + 'static) -> Self {
        self.event = Some(Arc::new(callback));
        self
    }

    /// Called for notifications of `subscription_type` only. Several callbacks
    /// may be registered for the same type; they run in registration order.
    #[must_use]
    pub fn on_event_type(
        mut self,
        subscription_type: impl Into<String>,
        callback: impl Fn(&str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.typed.entry(subscription_type.into()).or_default().push(Arc::new(callback));
        self
    }

    /// Called additionally for channel point redemptions.
    #[must_use]
    pub fn on_redemption(mut self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.redemption = Some(Arc::new(callback));
        self
    }

    pub fn notify_connectivity(&self, connected: bool) {
        if let Some(callback) = &self.connectivity {
            callback(connected);
        }
    }

    pub fn emit_event(&self, subscription_type: &str, event: &Value) {
        for callback in self.typed.get(subscription_type).into_iter().flatten() {
            callback(subscription_type, event);
        }
        if let Some(callback) = &self.event {
            callback(subscription_type, event);
        }
    }

    pub fn emit_redemption(&self, event: &Value) {
        if let Some(callback) = &self.redemption {
            callback(event);
        }
    }
}
