//! Token endpoint port

use async_trait::async_trait;
use wrike_domain::{AuthInfo, GatewayResult};

/// Exchanges grants for token pairs at the provider's token endpoint.
///
/// Neither operation retries; a non-accepted status is a hard failure.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// `grant_type=authorization_code`: trades a fresh authorization code.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::TokenExchange` if the endpoint does not answer
    /// 200 with a token pair.
    async fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> GatewayResult<AuthInfo>;

    /// `grant_type=refresh_token`: renews the access token.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::TokenExchange` if the endpoint does not answer
    /// 200 with a token pair.
    async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> GatewayResult<AuthInfo>;
}
