//! Port interfaces for the EventSub subscription API
//!
//! The reconciler only needs list, create and delete; transport, paging and
//! authentication stay in the adapter.

use async_trait::async_trait;
use streamgate_domain::{EventSubscriptionDesired, EventSubscriptionRemote, Result};

/// Remote subscription registry.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Every subscription currently registered for the authenticated client.
    async fn list_subscriptions(&self) -> Result<Vec<EventSubscriptionRemote>>;

    /// Register `desired` bound to the websocket session `session_id`.
    async fn create_subscription(
        &self,
        desired: &EventSubscriptionDesired,
        session_id: &str,
    ) -> Result<()>;

    /// Remove a subscription by id. An already-missing subscription counts
    /// as removed.
    async fn delete_subscription(&self, subscription_id: &str) -> Result<()>;
}
