//! # StreamGate Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for tokens, browsers and the
//!   subscription registry
//! - Subscription reconciliation and EventSub frame dispatch
//!
//! ## Architecture Principles
//! - Only depends on `streamgate-domain`
//! - No HTTP, websocket or file code
//! - All external dependencies via traits

pub mod auth;
pub mod eventsub;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{AuthObserver, BrowserLauncher, TokenProvider};
pub use eventsub::ports::SubscriptionApi;
pub use eventsub::{
    DispatchAction, EventDispatcher, EventHandlers, ReconcileAction, ReconcileReport,
    SessionTracker, SubscriptionReconciler,
};
