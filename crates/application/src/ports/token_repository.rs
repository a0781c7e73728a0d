//! Token persistence ports

use async_trait::async_trait;
use wrike_domain::{AuthInfo, GatewayResult};

/// Durable record holding the current token pair.
///
/// Writes replace the whole record. No cross-process locking is done:
/// two processes refreshing at once may overwrite each other's tokens.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Reads the stored token pair.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::TokenStorage` if the record exists but cannot
    /// be read or decoded. A missing record is `Ok(None)`.
    async fn load(&self) -> GatewayResult<Option<AuthInfo>>;

    /// Overwrites the record with `auth_info`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::TokenStorage` if the record cannot be written.
    async fn save(&self, auth_info: &AuthInfo) -> GatewayResult<()>;

    /// Removes the record. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::TokenStorage` on I/O failure.
    async fn clear(&self) -> GatewayResult<()>;
}

/// Receives every newly persisted token pair.
pub trait TokensObserver: Send + Sync {
    /// Called after a changed token pair has been saved.
    fn new_tokens(&self, refresh_token: &str, access_token: &str);
}
