//! Subscription reconciliation - core business logic
//!
//! Brings the remote subscription list in line with a desired set for the
//! current websocket session. Each desired subscription is handled on its
//! own: list, then act. A failure on one is recorded and the rest proceed.

use std::sync::Arc;

use streamgate_domain::{EventSubscriptionDesired, EventSubscriptionRemote, StreamGateError};
use tracing::{debug, info, warn};

use super::ports::SubscriptionApi;

/// What happened to one desired subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// A matching subscription was already bound to this session.
    Kept,
    /// No match existed; one was created.
    Created,
    /// Matches bound to other sessions were deleted, then one was created.
    Replaced { deleted: usize },
    Failed(StreamGateError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOutcome {
    pub event_type: String,
    pub action: ReconcileAction,
}

/// Per-subscription results of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub outcomes: Vec<SubscriptionOutcome>,
}

impl ReconcileReport {
    fn count(&self, predicate: impl Fn(&ReconcileAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.action)).count()
    }

    #[must_use]
    pub fn kept(&self) -> usize {
        self.count(|a| matches!(a, ReconcileAction::Kept))
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, ReconcileAction::Created))
    }

    #[must_use]
    pub fn replaced(&self) -> usize {
        self.count(|a| matches!(a, ReconcileAction::Replaced { .. }))
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&SubscriptionOutcome> {
        self.outcomes.iter().filter(|o| matches!(o.action, ReconcileAction::Failed(_))).collect()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().is_empty()
    }
}

/// Reconciles desired subscriptions against the remote registry.
pub struct SubscriptionReconciler {
    api: Arc<dyn SubscriptionApi>,
}

impl SubscriptionReconciler {
    pub fn new(api: Arc<dyn SubscriptionApi>) -> Self {
        Self { api }
    }

    /// Reconcile every entry of `desired` for `session_id`, in order.
    pub async fn reconcile(
        &self,
        desired: &[EventSubscriptionDesired],
        session_id: &str,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for subscription in desired {
            let action = match self.reconcile_one(subscription, session_id).await {
                Ok(action) => action,
                Err(err) => {
                    warn!(
                        subscription_type = %subscription.event_type,
                        session_id = %session_id,
                        error = %err,
                        "Failed to reconcile subscription"
                    );
                    ReconcileAction::Failed(err)
                }
            };
            report
                .outcomes
                .push(SubscriptionOutcome { event_type: subscription.event_type.clone(), action });
        }

        info!(
            session_id = %session_id,
            kept = report.kept(),
            created = report.created(),
            replaced = report.replaced(),
            failed = report.failures().len(),
            "Subscription reconcile finished"
        );
        report
    }

    async fn reconcile_one(
        &self,
        desired: &EventSubscriptionDesired,
        session_id: &str,
    ) -> Result<ReconcileAction, StreamGateError> {
        let remote = self.api.list_subscriptions().await?;
        let matches: Vec<&EventSubscriptionRemote> =
            remote.iter().filter(|r| r.matches(desired)).collect();

        if matches.iter().any(|r| r.is_bound_to(session_id)) {
            debug!(subscription_type = %desired.event_type, "Subscription already bound to session");
            return Ok(ReconcileAction::Kept);
        }

        for stale in &matches {
            debug!(
                subscription_type = %desired.event_type,
                subscription_id = %stale.id,
                stale_session = ?stale.transport.session_id,
                "Deleting subscription bound to another session"
            );
            self.api.delete_subscription(&stale.id).await?;
        }

        self.api.create_subscription(desired, session_id).await?;

        if matches.is_empty() {
            Ok(ReconcileAction::Created)
        } else {
            Ok(ReconcileAction::Replaced { deleted: matches.len() })
        }
    }
}
