//! # StreamGate Infrastructure
//!
//! Adapters behind the ports defined in `streamgate-core`.
//!
//! This crate contains:
//! - The retrying HTTP client used by every outbound call
//! - The encrypted credential document and config loader
//! - OAuth authorization with a loopback callback listener
//! - Twitch Helix, EventSub websocket and chat adapters
//! - Logging initialisation
//!
//! ## Architecture
//! - Implements traits defined in `streamgate-core`
//! - Contains all "impure" code (files, sockets, keychain)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use config::CredentialStore;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::oauth::{OAuthCoordinator, PendingAuthorization};
pub use integrations::twitch::{
    ChatSender, EventSubConnection, HelixApi, HelixSubscriptionClient, SessionEnd,
};
pub use observability::init_tracing;
