//! Port interfaces for platform authorization
//!
//! Collaborators (chat relay, eventsub session) only ever ask for a token;
//! the OAuth adapter behind these traits owns every other detail.

use async_trait::async_trait;
use streamgate_domain::{AuthFailure, AuthSuccess, PlatformId, Result};

/// Supplies bearer tokens for outbound platform calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token for `platform`, refreshed when it is inside the
    /// expiry window or `force_refresh` is set.
    ///
    /// Returns `None` only when no token was ever stored.
    async fn access_token(&self, platform: PlatformId, force_refresh: bool) -> Option<String>;

    /// Client id registered for `platform`, sent alongside bearer tokens by
    /// APIs that require it.
    async fn client_id(&self, platform: PlatformId) -> Option<String>;
}

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    /// # Errors
    /// Returns an error when no browser could be started.
    fn open(&self, url: &str) -> Result<()>;
}

/// Notified once per authorization attempt when it reaches a terminal phase.
pub trait AuthObserver: Send + Sync {
    fn on_completed(&self, success: &AuthSuccess);

    fn on_failed(&self, failure: &AuthFailure);
}
