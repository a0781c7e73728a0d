//! Gateway configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use wrike_domain::auth::constants::{
    API_BASE_URL, AUTHORIZE_URL, DEFAULT_CALLBACK_PORT, TOKEN_URL, scope_param,
};
use wrike_domain::{GatewayError, GatewayResult};

/// Settings for one gateway instance.
///
/// Every field has a default except the three client credentials, which
/// `validate` requires before any network or browser action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// `OAuth2` client id.
    pub client_id: String,
    /// `OAuth2` client secret.
    pub client_secret: String,
    /// Redirect URI registered for the client; must reach the listener.
    pub redirect_uri: String,
    /// Backing file for the token pair. `None` keeps tokens in memory.
    pub token_file: Option<PathBuf>,
    /// Browser-facing authorization endpoint.
    pub authorize_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// API base used when the token names no host.
    pub api_base_url: String,
    /// Interface the callback listener binds.
    pub callback_host: String,
    /// Port the callback listener binds.
    pub callback_port: u16,
    /// Hold the browser response until a redirect target is supplied.
    pub wait_for_redirect: bool,
    /// Upper bound on the browser login, in seconds.
    pub authorization_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            token_file: None,
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            callback_host: "127.0.0.1".to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
            wait_for_redirect: false,
            authorization_timeout_secs: 300,
        }
    }
}

impl GatewayConfig {
    /// Creates a config with the given client credentials and defaults
    /// for everything else.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    /// Sets the token file.
    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Checks that the client credentials are present.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` naming the first missing field.
    pub fn validate(&self) -> GatewayResult<()> {
        let required = [
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
            ("redirect URI", &self.redirect_uri),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(GatewayError::Configuration(format!(
                    "OAuth2 {name} is not set"
                )));
            }
        }
        Ok(())
    }

    /// Bound on the browser login.
    #[must_use]
    pub const fn authorization_timeout(&self) -> Duration {
        Duration::from_secs(self.authorization_timeout_secs)
    }

    /// Builds the URL the user's browser is sent to.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` if the credentials are missing
    /// or `authorize_url` is not a valid URL.
    pub fn authorization_url(&self) -> GatewayResult<String> {
        self.validate()?;
        let mut url = Url::parse(&self.authorize_url).map_err(|e| {
            GatewayError::Configuration(format!(
                "invalid authorization URL {}: {e}",
                self.authorize_url
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &scope_param());
        Ok(url.into())
    }
}
