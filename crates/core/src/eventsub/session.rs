//! Connection state and current session id for one EventSub connection

use parking_lot::RwLock;
use streamgate_domain::ConnectionState;
use tracing::debug;

#[derive(Debug, Default)]
struct SessionState {
    connection: ConnectionState,
    session_id: Option<String>,
}

/// Shared holder of the connection state machine.
///
/// `Disconnected -> Connecting -> SessionPending -> Reconciling -> Active`,
/// and back to `Disconnected` from any state. The session id exists only
/// while a connection is open.
#[derive(Debug, Default)]
pub struct SessionTracker {
    inner: RwLock<SessionState>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.read().connection
    }

    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.inner.read().session_id.clone()
    }

    pub fn connecting(&self) {
        self.transition(ConnectionState::Connecting);
    }

    /// Socket is open; waiting for the welcome frame.
    pub fn awaiting_welcome(&self) {
        self.transition(ConnectionState::SessionPending);
    }

    /// Record the session announced by a welcome frame.
    pub fn welcome(&self, session_id: &str) {
        let mut inner = self.inner.write();
        inner.session_id = Some(session_id.to_string());
        inner.connection = ConnectionState::Reconciling;
        debug!(session_id = %session_id, "EventSub session established");
    }

    pub fn activate(&self) {
        self.transition(ConnectionState::Active);
    }

    /// Clear the session; returns whether the tracker was connected at all.
    pub fn disconnect(&self) -> bool {
        let mut inner = self.inner.write();
        let was_connected = inner.connection != ConnectionState::Disconnected;
        inner.connection = ConnectionState::Disconnected;
        inner.session_id = None;
        was_connected
    }

    fn transition(&self, next: ConnectionState) {
        let mut inner = self.inner.write();
        debug!(from = %inner.connection, to = %next, "EventSub connection state change");
        inner.connection = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_connection_lifecycle() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.state(), ConnectionState::Disconnected);

        tracker.connecting();
        tracker.awaiting_welcome();
        assert_eq!(tracker.state(), ConnectionState::SessionPending);
        assert!(tracker.session_id().is_none());

        tracker.welcome("session-abc");
        assert_eq!(tracker.state(), ConnectionState::Reconciling);
        assert_eq!(tracker.session_id().as_deref(), Some("session-abc"));

        tracker.activate();
        assert_eq!(tracker.state(), ConnectionState::Active);
    }

    #[test]
    fn disconnect_clears_session() {
        let tracker = SessionTracker::new();
        assert!(!tracker.disconnect());

        tracker.connecting();
        tracker.welcome("session-abc");
        assert!(tracker.disconnect());
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert!(tracker.session_id().is_none());
    }

    #[test]
    fn new_welcome_replaces_session() {
        let tracker = SessionTracker::new();
        tracker.welcome("first");
        tracker.welcome("second");
        assert_eq!(tracker.session_id().as_deref(), Some("second"));
    }
}
