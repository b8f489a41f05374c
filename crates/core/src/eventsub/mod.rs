//! EventSub session core
//!
//! Pure logic for keeping one subscription set live on a websocket session:
//! reconciling the remote registry, tracking connection state and routing
//! frames to callbacks. The websocket and HTTP adapters live in infra.

pub mod dispatcher;
pub mod handlers;
pub mod ports;
pub mod reconciler;
pub mod session;

pub use dispatcher::{DispatchAction, EventDispatcher};
pub use handlers::EventHandlers;
pub use ports::SubscriptionApi;
pub use reconciler::{ReconcileAction, ReconcileReport, SubscriptionOutcome, SubscriptionReconciler};
pub use session::SessionTracker;
