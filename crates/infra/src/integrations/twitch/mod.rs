//! Twitch adapters: Helix REST, EventSub websocket and chat

pub mod chat;
pub mod eventsub;
pub mod helix;
pub mod subscriptions;

pub use chat::ChatSender;
pub use eventsub::{EventSubConnection, SessionEnd};
pub use helix::HelixApi;
pub use subscriptions::HelixSubscriptionClient;
