//! Domain types and models

pub mod auth;
pub mod credential;
pub mod eventsub;
pub mod platform;

pub use auth::{AuthFailure, AuthFailureKind, AuthFlowPhase, AuthSuccess, RefreshOutcome};
pub use credential::PlatformCredential;
pub use eventsub::{
    default_twitch_subscriptions, ConnectionState, EventSubMessage, EventSubscriptionDesired,
    EventSubscriptionRemote, SubscriptionCondition, SubscriptionTransport,
};
pub use platform::PlatformId;
