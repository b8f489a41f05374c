//! OAuth 2.0 authorization for streaming platforms
//!
//! - **[`providers`]**: default endpoints and scopes per platform
//! - **[`callback`]**: single-use loopback listener for the redirect
//! - **[`coordinator`]**: authorization, refresh and token lookup
//! - **[`browser`]**: default [`BrowserLauncher`](streamgate_core::BrowserLauncher)

pub mod browser;
pub mod callback;
pub mod coordinator;
pub mod providers;

pub use browser::OpenBrowserLauncher;
pub use callback::{CallbackError, CallbackServer};
pub use coordinator::{OAuthCoordinator, PendingAuthorization};
pub use providers::{client_config, default_endpoints, resolve_token_url, ProviderEndpoints};
