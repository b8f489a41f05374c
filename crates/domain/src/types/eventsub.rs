//! EventSub subscription records and websocket envelope

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_domain_enum_conversions;

/// Condition map identifying the target of a subscription.
///
/// Ordered so that logging and request bodies are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionCondition(pub BTreeMap<String, String>);

impl SubscriptionCondition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True when every entry of `other` is present here with the same value.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other.0.iter().all(|(key, value)| self.0.get(key) == Some(value))
    }
}

/// A subscription the session wants to keep live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscriptionDesired {
    #[serde(rename = "type")]
    pub event_type: String,
    pub version: String,
    pub condition: SubscriptionCondition,
}

impl EventSubscriptionDesired {
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        version: impl Into<String>,
        condition: SubscriptionCondition,
    ) -> Self {
        Self { event_type: event_type.into(), version: version.into(), condition }
    }
}

/// Transport binding reported by the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTransport {
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A subscription as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscriptionRemote {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub condition: SubscriptionCondition,
    #[serde(default)]
    pub transport: SubscriptionTransport,
}

impl EventSubscriptionRemote {
    /// Same type and a condition covering every desired entry.
    #[must_use]
    pub fn matches(&self, desired: &EventSubscriptionDesired) -> bool {
        self.event_type == desired.event_type && self.condition.contains_all(&desired.condition)
    }

    #[must_use]
    pub fn is_bound_to(&self, session_id: &str) -> bool {
        self.transport.session_id.as_deref() == Some(session_id)
    }
}

/// Lifecycle of one websocket connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    SessionPending,
    Reconciling,
    Active,
}

impl_domain_enum_conversions!(ConnectionState {
    Disconnected => "disconnected",
    Connecting => "connecting",
    SessionPending => "session_pending",
    Reconciling => "reconciling",
    Active => "active",
});

/// Typed view of one websocket frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSubMessage {
    SessionWelcome { session_id: String, keepalive_timeout_seconds: Option<u64> },
    Keepalive,
    Notification { subscription_type: String, event: Value },
    Reconnect { reconnect_url: Option<String> },
    Revocation { subscription_type: String, status: String },
    Unknown { message_type: String },
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    metadata: RawMetadata,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    message_type: String,
    #[serde(default)]
    subscription_type: Option<String>,
}

impl EventSubMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    /// Returns a description of the problem when the frame is not JSON, has
    /// no `metadata.message_type`, or a known message lacks required fields.
    pub fn parse(frame: &str) -> Result<Self, String> {
        let envelope: RawEnvelope =
            serde_json::from_str(frame).map_err(|e| format!("malformed envelope: {e}"))?;
        let payload = &envelope.payload;

        match envelope.metadata.message_type.as_str() {
            "session_welcome" => {
                let session = &payload["session"];
                let session_id = session["id"]
                    .as_str()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| "welcome frame without session id".to_string())?;
                Ok(Self::SessionWelcome {
                    session_id: session_id.to_string(),
                    keepalive_timeout_seconds: session["keepalive_timeout_seconds"].as_u64(),
                })
            }
            "session_keepalive" => Ok(Self::Keepalive),
            "notification" => {
                let subscription_type = payload["subscription"]["type"]
                    .as_str()
                    .map(str::to_string)
                    .or(envelope.metadata.subscription_type)
                    .ok_or_else(|| "notification without subscription type".to_string())?;
                Ok(Self::Notification {
                    subscription_type,
                    event: payload.get("event").cloned().unwrap_or(Value::Null),
                })
            }
            "session_reconnect" => Ok(Self::Reconnect {
                reconnect_url: payload["session"]["reconnect_url"].as_str().map(str::to_string),
            }),
            "revocation" => Ok(Self::Revocation {
                subscription_type: payload["subscription"]["type"]
                    .as_str()
                    .map(str::to_string)
                    .or(envelope.metadata.subscription_type)
                    .unwrap_or_default(),
                status: payload["subscription"]["status"].as_str().unwrap_or_default().to_string(),
            }),
            other => Ok(Self::Unknown { message_type: other.to_string() }),
        }
    }
}

/// The fixed subscription set kept live for a broadcaster.
#[must_use]
pub fn default_twitch_subscriptions(broadcaster_id: &str) -> Vec<EventSubscriptionDesired> {
    let broadcaster = SubscriptionCondition::new().with("broadcaster_user_id", broadcaster_id);
    vec![
        EventSubscriptionDesired::new(
            "channel.follow",
            "2",
            broadcaster.clone().with("moderator_user_id", broadcaster_id),
        ),
        EventSubscriptionDesired::new("channel.subscribe", "1", broadcaster.clone()),
        EventSubscriptionDesired::new(
            "channel.raid",
            "1",
            SubscriptionCondition::new().with("to_broadcaster_user_id", broadcaster_id),
        ),
        EventSubscriptionDesired::new(
            "channel.channel_points_custom_reward_redemption.add",
            "1",
            broadcaster.clone(),
        ),
        EventSubscriptionDesired::new("channel.cheer", "1", broadcaster),
    ]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn remote(event_type: &str, condition: SubscriptionCondition, session: &str) -> EventSubscriptionRemote {
        EventSubscriptionRemote {
            id: "sub-1".into(),
            event_type: event_type.into(),
            version: "1".into(),
            status: "enabled".into(),
            condition,
            transport: SubscriptionTransport {
                method: "websocket".into(),
                session_id: Some(session.into()),
            },
        }
    }

    #[test]
    fn remote_condition_may_carry_extra_entries() {
        let desired = EventSubscriptionDesired::new(
            "channel.cheer",
            "1",
            SubscriptionCondition::new().with("broadcaster_user_id", "42"),
        );
        let wider = SubscriptionCondition::new()
            .with("broadcaster_user_id", "42")
            .with("moderator_user_id", "42");

        assert!(remote("channel.cheer", wider.clone(), "s").matches(&desired));
        assert!(!remote("channel.raid", wider, "s").matches(&desired));
        assert!(!remote(
            "channel.cheer",
            SubscriptionCondition::new().with("broadcaster_user_id", "7"),
            "s"
        )
        .matches(&desired));
    }

    #[test]
    fn parses_welcome_frame() {
        let frame = json!({
            "metadata": {"message_id": "m1", "message_type": "session_welcome"},
            "payload": {"session": {"id": "session-abc", "keepalive_timeout_seconds": 10}}
        })
        .to_string();

        assert_eq!(
            EventSubMessage::parse(&frame).unwrap(),
            EventSubMessage::SessionWelcome {
                session_id: "session-abc".into(),
                keepalive_timeout_seconds: Some(10)
            }
        );
    }

    #[test]
    fn parses_notification_frame() {
        let frame = json!({
            "metadata": {"message_type": "notification", "subscription_type": "channel.cheer"},
            "payload": {
                "subscription": {"type": "channel.cheer"},
                "event": {"bits": 100}
            }
        })
        .to_string();

        match EventSubMessage::parse(&frame).unwrap() {
            EventSubMessage::Notification { subscription_type, event } => {
                assert_eq!(subscription_type, "channel.cheer");
                assert_eq!(event["bits"], 100);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_and_malformed_frames() {
        let frame = json!({"metadata": {"message_type": "mystery"}}).to_string();
        assert_eq!(
            EventSubMessage::parse(&frame).unwrap(),
            EventSubMessage::Unknown { message_type: "mystery".into() }
        );
        assert!(EventSubMessage::parse("not json").is_err());
        assert!(EventSubMessage::parse(r#"{"payload": {}}"#).is_err());
        assert!(EventSubMessage::parse(
            r#"{"metadata": {"message_type": "session_welcome"}, "payload": {}}"#
        )
        .is_err());
    }

    #[test]
    fn default_set_targets_broadcaster() {
        let subscriptions = default_twitch_subscriptions("1234");
        assert_eq!(subscriptions.len(), 5);
        let follow = &subscriptions[0];
        assert_eq!(follow.event_type, "channel.follow");
        assert_eq!(follow.version, "2");
        assert_eq!(follow.condition.get("moderator_user_id"), Some("1234"));
        assert!(subscriptions
            .iter()
            .any(|s| s.event_type.contains(crate::constants::REDEMPTION_EVENT_MARKER)));
    }
}
