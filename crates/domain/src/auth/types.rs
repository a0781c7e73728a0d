//! Token and authorization-state types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Token pair returned by the Wrike token endpoint.
///
/// Only `access_token` and `refresh_token` are interpreted. Every other
/// provider field is preserved verbatim so the persisted file round-trips.
/// Instances are replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Bearer credential attached to API calls.
    pub access_token: String,
    /// Long-lived credential used to renew `access_token`.
    pub refresh_token: String,
    /// Lifetime of `access_token` in seconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Remaining provider fields (`token_type`, `host`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AuthInfo {
    /// Creates a token pair with no provider fields.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in: None,
            extra: BTreeMap::new(),
        }
    }

    /// Adds a provider field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Data-centre host reported by Wrike, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.extra
            .get("host")
            .and_then(Value::as_str)
            .filter(|h| !h.is_empty())
    }

    /// API base URL for this token: `https://{host}/api/v4` when the
    /// provider named a host, `default_base` otherwise.
    #[must_use]
    pub fn api_base_url(&self, default_base: &str) -> String {
        self.host().map_or_else(
            || default_base.trim_end_matches('/').to_string(),
            |host| format!("https://{host}/api/v4"),
        )
    }

    /// Returns the Authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("bearer {}", self.access_token)
    }
}

/// Result captured by the callback listener from its single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The redirect carried `code=<value>`.
    Code(String),
    /// The request had no recognizable code.
    Malformed,
}

impl CallbackOutcome {
    /// Returns the code, if one was captured.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            Self::Malformed => None,
        }
    }
}

/// Authentication state of a gateway instance.
///
/// `Refreshing` is only reachable from `Authenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayState {
    /// No token held.
    #[default]
    Unauthenticated,
    /// Browser flow in progress.
    Authenticating,
    /// A token is held and attached to calls.
    Authenticated,
    /// Exchanging the refresh token after a `not_authorized` response.
    Refreshing,
}

impl GatewayState {
    /// Check if a token operation is in progress.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::Authenticating | Self::Refreshing)
    }

    /// Returns true if the transition `self -> next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unauthenticated, Self::Authenticating | Self::Authenticated)
                | (Self::Authenticating, Self::Authenticated | Self::Unauthenticated)
                | (Self::Authenticated, Self::Refreshing | Self::Unauthenticated)
                | (Self::Refreshing, Self::Authenticated | Self::Unauthenticated)
        )
    }

    /// Get a user-friendly message.
    #[must_use]
    pub const fn message(&self) -> &str {
        match self {
            Self::Unauthenticated => "Not authenticated",
            Self::Authenticating => "Waiting for authorization in browser...",
            Self::Authenticated => "Authenticated",
            Self::Refreshing => "Refreshing access token...",
        }
    }
}

/// Get a preview of a token (first 8 chars + ...).
///
/// Tokens are never logged or printed in full.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_auth_info_keeps_provider_fields() {
        let json = r#"{
            "access_token": "A",
            "refresh_token": "R",
            "token_type": "bearer",
            "expires_in": 3600,
            "host": "app-eu.wrike.com"
        }"#;
        let info: AuthInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.access_token, "A");
        assert_eq!(info.refresh_token, "R");
        assert_eq!(info.expires_in, Some(3600));
        assert_eq!(info.extra.get("token_type"), Some(&Value::from("bearer")));

        let back: AuthInfo = serde_json::from_str(&serde_json::to_string(&info).unwrap()).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_auth_info_requires_both_tokens() {
        let result = serde_json::from_str::<AuthInfo>(r#"{"access_token": "A"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_api_base_url_follows_host() {
        let info = AuthInfo::new("A", "R");
        assert_eq!(
            info.api_base_url("https://www.wrike.com/api/v4/"),
            "https://www.wrike.com/api/v4"
        );

        let info = info.with_field("host", "app-eu.wrike.com");
        assert_eq!(
            info.api_base_url("https://www.wrike.com/api/v4"),
            "https://app-eu.wrike.com/api/v4"
        );
    }

    #[test]
    fn test_authorization_header() {
        assert_eq!(AuthInfo::new("tok", "r").authorization_header(), "bearer tok");
    }

    #[test]
    fn test_state_transitions() {
        let state = GatewayState::default();
        assert_eq!(state, GatewayState::Unauthenticated);
        assert!(state.can_transition_to(GatewayState::Authenticating));
        assert!(!state.can_transition_to(GatewayState::Refreshing));
        assert!(GatewayState::Authenticated.can_transition_to(GatewayState::Refreshing));
        assert!(!GatewayState::Authenticating.can_transition_to(GatewayState::Refreshing));
        assert!(GatewayState::Refreshing.is_in_progress());
        assert!(!GatewayState::Authenticated.is_in_progress());
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "short");
    }

    #[test]
    fn test_callback_outcome_code() {
        assert_eq!(CallbackOutcome::Code("abc".to_string()).code(), Some("abc"));
        assert_eq!(CallbackOutcome::Malformed.code(), None);
    }
}
