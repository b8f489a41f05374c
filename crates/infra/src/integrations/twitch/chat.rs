//! Outbound chat messages

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, warn};

use super::helix::HelixApi;

const CHAT_MESSAGES_PATH: &str = "/chat/messages";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    broadcaster_id: &'a str,
    sender_id: &'a str,
    message: &'a str,
}

/// Sends chat messages as the authenticated user.
#[derive(Debug, Clone)]
pub struct ChatSender {
    api: HelixApi,
}

impl ChatSender {
    pub fn new(api: HelixApi) -> Self {
        Self { api }
    }

    /// Post `text` to the broadcaster's chat.
    ///
    /// Returns `true` on any 2xx. Failures are logged, never raised.
    pub async fn send_message(&self, broadcaster_id: &str, sender_id: &str, text: &str) -> bool {
        let body = ChatMessage { broadcaster_id, sender_id, message: text };

        match self.api.execute(Method::POST, CHAT_MESSAGES_PATH, |r| r.json(&body)).await {
            Ok(response) if response.status().is_success() => {
                debug!(broadcaster_id = %broadcaster_id, "Chat message sent");
                true
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                warn!(broadcaster_id = %broadcaster_id, status, body = %body, "Chat message rejected");
                false
            }
            Err(err) => {
                warn!(broadcaster_id = %broadcaster_id, error = %err, "Chat message failed");
                false
            }
        }
    }
}
