//! Token endpoint client.
//!
//! Sends `get_token` and `refresh_token` through the same transport as
//! ordinary API calls, using the token-endpoint operation table.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use wrike_domain::{ApiRegistry, AuthInfo, GatewayError, GatewayResult, token_registry};

use crate::ports::{ApiRequest, ApiTransport, TokenExchange};

/// `OAuth2` error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// `TokenExchange` implementation over an `ApiTransport`.
pub struct TokenEndpointClient {
    transport: Arc<dyn ApiTransport>,
    token_url: String,
    registry: ApiRegistry,
}

impl TokenEndpointClient {
    /// Create a client posting to `token_url`.
    #[must_use]
    pub fn new(transport: Arc<dyn ApiTransport>, token_url: impl Into<String>) -> Self {
        Self {
            transport,
            token_url: token_url.into(),
            registry: token_registry(),
        }
    }

    async fn exchange(
        &self,
        api: &str,
        params: BTreeMap<String, Value>,
    ) -> GatewayResult<AuthInfo> {
        let descriptor = self.registry.get(api)?;
        let request = ApiRequest::new(descriptor.method, self.token_url.clone())
            .with_params(descriptor.merged_params(&params));

        tracing::debug!(api, url = %self.token_url, "requesting token");

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| GatewayError::TokenExchange {
                api: api.to_string(),
                status: 0,
                body: e.to_string(),
            })?;

        let status = response.status.as_u16();
        if !descriptor.accepts(status) {
            let body = serde_json::from_value::<TokenErrorResponse>(response.body.clone())
                .map_or_else(
                    |_| response.body_text(),
                    |e| e.error_description.map_or(e.error.clone(), |d| format!("{}: {d}", e.error)),
                );
            tracing::warn!(api, status, "token endpoint rejected request");
            return Err(GatewayError::TokenExchange {
                api: api.to_string(),
                status,
                body,
            });
        }

        serde_json::from_value(response.body).map_err(|e| GatewayError::TokenExchange {
            api: api.to_string(),
            status,
            body: format!("failed to parse token response: {e}"),
        })
    }
}

fn params<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
}

#[async_trait]
impl TokenExchange for TokenEndpointClient {
    async fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> GatewayResult<AuthInfo> {
        self.exchange(
            "get_token",
            params([
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ]),
        )
        .await
    }

    async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> GatewayResult<AuthInfo> {
        self.exchange(
            "refresh_token",
            params([
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ]),
        )
        .await
    }
}
