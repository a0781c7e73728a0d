//! HTTP transport port

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use wrike_domain::{ApiResponse, GatewayResult, HttpMethod};

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Value of the `Authorization` header, if any.
    pub authorization: Option<String>,
    /// Query parameters for GET/DELETE, form fields for POST/PUT.
    pub params: BTreeMap<String, Value>,
}

impl ApiRequest {
    /// Creates an unauthenticated request with no parameters.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            authorization: None,
            params: BTreeMap::new(),
        }
    }

    /// Sets the `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Parameters as `(name, text)` pairs. Strings are sent verbatim and
    /// any other JSON value as its compact JSON text.
    #[must_use]
    pub fn encoded_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), text)
            })
            .collect()
    }
}

/// Port for sending requests to the Wrike API or token endpoint.
///
/// Any HTTP status is a successful transport result; only failures to
/// send or read are errors.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends the request and decodes the response body.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` on network or decoding failure.
    async fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse>;
}
