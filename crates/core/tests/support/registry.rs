//! In-memory mock for `SubscriptionApi`

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use streamgate_core::SubscriptionApi;
use streamgate_domain::{
    EventSubscriptionDesired, EventSubscriptionRemote, Result as DomainResult, StreamGateError,
    SubscriptionCondition, SubscriptionTransport,
};

/// One call made against the registry, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List,
    Create { event_type: String, session_id: String },
    Delete { id: String },
}

/// Registry seeded with remote subscriptions; creations and deletions
/// mutate the stored list.
#[derive(Default)]
pub struct MockSubscriptionApi {
    remote: Mutex<Vec<EventSubscriptionRemote>>,
    calls: Mutex<Vec<RegistryCall>>,
    next_id: AtomicUsize,
    fail_deletes: bool,
    fail_creates_for: Option<String>,
}

impl MockSubscriptionApi {
    pub fn new(remote: Vec<EventSubscriptionRemote>) -> Self {
        Self { remote: Mutex::new(remote), ..Self::default() }
    }

    /// Every delete returns an error.
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Creation of `event_type` returns an error.
    pub fn failing_create(mut self, event_type: &str) -> Self {
        self.fail_creates_for = Some(event_type.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&RegistryCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn lists(&self) -> usize {
        self.count(|c| matches!(c, RegistryCall::List))
    }

    pub fn creates(&self) -> usize {
        self.count(|c| matches!(c, RegistryCall::Create { .. }))
    }

    pub fn deletes(&self) -> usize {
        self.count(|c| matches!(c, RegistryCall::Delete { .. }))
    }

    pub fn remote(&self) -> Vec<EventSubscriptionRemote> {
        self.remote.lock().clone()
    }
}

#[async_trait]
impl SubscriptionApi for MockSubscriptionApi {
    async fn list_subscriptions(&self) -> DomainResult<Vec<EventSubscriptionRemote>> {
        self.calls.lock().push(RegistryCall::List);
        Ok(self.remote.lock().clone())
    }

    async fn create_subscription(
        &self,
        desired: &EventSubscriptionDesired,
        session_id: &str,
    ) -> DomainResult<()> {
        self.calls.lock().push(RegistryCall::Create {
            event_type: desired.event_type.clone(),
            session_id: session_id.to_string(),
        });
        if self.fail_creates_for.as_deref() == Some(desired.event_type.as_str()) {
            return Err(StreamGateError::Network("409 conflict".into()));
        }
        let id = format!("created-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.remote.lock().push(remote(&id, desired, session_id));
        Ok(())
    }

    async fn delete_subscription(&self, subscription_id: &str) -> DomainResult<()> {
        self.calls.lock().push(RegistryCall::Delete { id: subscription_id.to_string() });
        if self.fail_deletes {
            return Err(StreamGateError::Network("503 service unavailable".into()));
        }
        self.remote.lock().retain(|r| r.id != subscription_id);
        Ok(())
    }
}

/// Remote record for `desired` bound to `session_id`.
pub fn remote(
    id: &str,
    desired: &EventSubscriptionDesired,
    session_id: &str,
) -> EventSubscriptionRemote {
    EventSubscriptionRemote {
        id: id.to_string(),
        event_type: desired.event_type.clone(),
        version: desired.version.clone(),
        status: "enabled".into(),
        condition: desired.condition.clone(),
        transport: SubscriptionTransport {
            method: "websocket".into(),
            session_id: Some(session_id.to_string()),
        },
    }
}

/// Single desired subscription for a broadcaster.
pub fn desired(event_type: &str, broadcaster_id: &str) -> EventSubscriptionDesired {
    EventSubscriptionDesired::new(
        event_type,
        "1",
        SubscriptionCondition::new().with("broadcaster_user_id", broadcaster_id),
    )
}
