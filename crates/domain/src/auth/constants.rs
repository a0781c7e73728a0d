//! Fixed `OAuth2` endpoints and parameters for Wrike.

/// Browser-facing authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://www.wrike.com/oauth2/authorize";

/// Token endpoint used for both code exchange and refresh.
pub const TOKEN_URL: &str = "https://www.wrike.com/oauth2/token";

/// Default REST API base when the token carries no `host`.
pub const API_BASE_URL: &str = "https://www.wrike.com/api/v4";

/// Local port the callback listener binds by default.
pub const DEFAULT_CALLBACK_PORT: u16 = 19877;

/// Scopes requested on every authorization.
///
/// Workspace, account-management and workflow access, read and write.
pub const SCOPES: &[&str] = &[
    "Default",
    "wsReadOnly",
    "wsReadWrite",
    "amReadOnlyUser",
    "amReadWriteUser",
    "amReadOnlyWorkflow",
    "amReadWriteWorkflow",
];

/// Error code in a 401 body that triggers a token refresh.
pub const NOT_AUTHORIZED: &str = "not_authorized";

/// Returns the scope list in the comma-separated form Wrike expects.
#[must_use]
pub fn scope_param() -> String {
    SCOPES.join(",")
}
