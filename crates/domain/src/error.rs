//! Domain error types

use thiserror::Error;

/// Errors surfaced by the gateway to its callers.
///
/// Upstream API failures (any non-2xx other than the refresh trigger) are
/// not errors: they are returned to the caller as an `ApiResponse`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Client id, secret, or redirect URI is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The browser flow did not deliver a code before the deadline.
    #[error("authorization timed out after {after_secs} seconds")]
    AuthorizationTimeout {
        /// Seconds waited before giving up.
        after_secs: u64,
    },

    /// The callback request did not carry an authorization code.
    #[error("authorization callback did not contain a code")]
    MalformedCallback,

    /// The token endpoint rejected a `get_token` or `refresh_token` call.
    #[error("token exchange `{api}` failed with status {status}: {body}")]
    TokenExchange {
        /// Symbolic name of the token operation.
        api: String,
        /// Status returned by the token endpoint (0 if no response).
        status: u16,
        /// Raw response body or transport diagnostic.
        body: String,
    },

    /// The API still answered `not_authorized` after one refresh.
    #[error("authentication failed with status {status}: {body}")]
    AuthenticationFailed {
        /// Status of the final upstream response.
        status: u16,
        /// Body of the final upstream response.
        body: String,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The local callback listener could not bind its address.
    #[error("failed to bind callback listener on {addr}: {message}")]
    ListenerBind {
        /// Address the listener attempted to bind.
        addr: String,
        /// OS diagnostic.
        message: String,
    },

    /// The system browser could not be opened.
    #[error("failed to open browser: {0}")]
    Browser(String),

    /// The HTTP request could not be sent or its response read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The token file could not be read or written.
    #[error("token storage error: {0}")]
    TokenStorage(String),

    /// No descriptor is registered under this name.
    #[error("unknown API operation: {0}")]
    UnknownApi(String),

    /// A `{placeholder}` in a descriptor path had no argument.
    #[error("missing path argument `{argument}` for API operation `{api}`")]
    MissingPathArgument {
        /// Symbolic operation name.
        api: String,
        /// Placeholder without a value.
        argument: String,
    },
}

impl GatewayError {
    /// Returns true if the error is terminal for the current credentials
    /// and a fresh login is required to continue.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::TokenExchange { .. }
        )
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
