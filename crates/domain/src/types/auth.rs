//! Outcomes of authorization and refresh attempts

use serde::{Deserialize, Serialize};

use super::platform::PlatformId;
use crate::impl_domain_enum_conversions;

/// Phase of a single authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFlowPhase {
    Idle,
    AwaitingCallback,
    Exchanging,
    Completed,
    Failed,
}

impl_domain_enum_conversions!(AuthFlowPhase {
    Idle => "idle",
    AwaitingCallback => "awaiting_callback",
    Exchanging => "exchanging",
    Completed => "completed",
    Failed => "failed",
});

impl AuthFlowPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Why an authorization attempt ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureKind {
    /// Client id missing or still a placeholder.
    NotConfigured,
    /// Loopback listener could not bind or the browser could not be opened.
    Setup,
    /// No callback arrived within the callback window.
    Timeout,
    /// Callback `state` did not match the nonce sent with the request.
    StateMismatch,
    /// Callback carried no `code`.
    MissingCode,
    /// The provider redirected back with an `error` parameter.
    Denied,
    /// Token endpoint rejected the code or returned an unusable body.
    ExchangeFailed,
    /// Tokens were issued but could not be written to the credential store.
    Persistence,
}

/// Terminal failure of an authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailure {
    pub platform: PlatformId,
    pub kind: AuthFailureKind,
    pub detail: String,
    /// Raw token endpoint body, kept so callers can read provider error codes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
}

impl AuthFailure {
    #[must_use]
    pub fn new(platform: PlatformId, kind: AuthFailureKind, detail: impl Into<String>) -> Self {
        Self { platform, kind, detail: detail.into(), raw_body: None }
    }

    #[must_use]
    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} authorization failed ({:?}): {}", self.platform, self.kind, self.detail)
    }
}

impl std::error::Error for AuthFailure {}

/// Tokens obtained by a completed authorization attempt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub platform: PlatformId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub issued_at: i64,
}

impl std::fmt::Debug for AuthSuccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSuccess")
            .field("platform", &self.platform)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Result of a refresh-token grant. Never raised; always returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { access_token: String },
    MissingRefreshToken,
    MissingTokenUrl,
    /// Endpoint answered with a non-success status after retries.
    Rejected { status: u16, body: String },
    /// Endpoint answered 2xx without a usable JSON `access_token`.
    InvalidResponse(String),
    /// Transport failed after retries, or tokens could not be persisted.
    Failed(String),
}

impl RefreshOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Refreshed { access_token } => Some(access_token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(AuthFlowPhase::Completed.is_terminal());
        assert!(AuthFlowPhase::Failed.is_terminal());
        assert!(!AuthFlowPhase::AwaitingCallback.is_terminal());
        assert_eq!(AuthFlowPhase::AwaitingCallback.to_string(), "awaiting_callback");
    }

    #[test]
    fn success_debug_redacts_tokens() {
        let success = AuthSuccess {
            platform: PlatformId::Twitch,
            access_token: "secret-access".into(),
            refresh_token: Some("secret-refresh".into()),
            expires_in: Some(3600),
            scope: None,
            issued_at: 0,
        };
        let rendered = format!("{success:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn refresh_outcome_exposes_token_only_on_success() {
        let ok = RefreshOutcome::Refreshed { access_token: "new".into() };
        assert!(ok.is_success());
        assert_eq!(ok.access_token(), Some("new"));
        assert_eq!(RefreshOutcome::MissingTokenUrl.access_token(), None);
    }
}
