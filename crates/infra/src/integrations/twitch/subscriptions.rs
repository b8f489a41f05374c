//! Helix EventSub subscription registry

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use streamgate_core::SubscriptionApi;
use streamgate_domain::{
    EventSubscriptionDesired, EventSubscriptionRemote, Result, StreamGateError,
    SubscriptionCondition,
};
use tracing::{debug, info};

use super::helix::{error_for_response, HelixApi};
use crate::errors::InfraError;

const SUBSCRIPTIONS_PATH: &str = "/eventsub/subscriptions";

#[derive(Debug, Deserialize)]
struct SubscriptionPage {
    #[serde(default)]
    data: Vec<EventSubscriptionRemote>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSubscription<'a> {
    #[serde(rename = "type")]
    event_type: &'a str,
    version: &'a str,
    condition: &'a SubscriptionCondition,
    transport: WebsocketTransport<'a>,
}

#[derive(Debug, Serialize)]
struct WebsocketTransport<'a> {
    method: &'static str,
    session_id: &'a str,
}

/// [`SubscriptionApi`] backed by Helix.
#[derive(Debug, Clone)]
pub struct HelixSubscriptionClient {
    api: HelixApi,
}

impl HelixSubscriptionClient {
    pub fn new(api: HelixApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SubscriptionApi for HelixSubscriptionClient {
    async fn list_subscriptions(&self) -> Result<Vec<EventSubscriptionRemote>> {
        let mut subscriptions = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let response = self
                .api
                .execute(Method::GET, SUBSCRIPTIONS_PATH, |request| match &cursor {
                    Some(after) => request.query(&[("after", after.as_str())]),
                    None => request,
                })
                .await?;
            if !response.status().is_success() {
                return Err(error_for_response(response).await);
            }

            let page: SubscriptionPage = response
                .json()
                .await
                .map_err(|e| StreamGateError::from(InfraError::from(e)))?;
            subscriptions.extend(page.data);

            match page.pagination.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(count = subscriptions.len(), "Listed EventSub subscriptions");
        Ok(subscriptions)
    }

    async fn create_subscription(
        &self,
        desired: &EventSubscriptionDesired,
        session_id: &str,
    ) -> Result<()> {
        let body = CreateSubscription {
            event_type: &desired.event_type,
            version: &desired.version,
            condition: &desired.condition,
            transport: WebsocketTransport { method: "websocket", session_id },
        };

        let response =
            self.api.execute(Method::POST, SUBSCRIPTIONS_PATH, |r| r.json(&body)).await?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        info!(
            subscription_type = %desired.event_type,
            session_id = %session_id,
            "Created EventSub subscription"
        );
        Ok(())
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<()> {
        let response = self
            .api
            .execute(Method::DELETE, SUBSCRIPTIONS_PATH, |r| r.query(&[("id", subscription_id)]))
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(subscription_id = %subscription_id, "Subscription already gone");
            return Ok(());
        }
        if !status.is_success() {
            return Err(error_for_response(response).await);
        }

        debug!(subscription_id = %subscription_id, "Deleted EventSub subscription");
        Ok(())
    }
}
