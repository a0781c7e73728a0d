//! API transport implementation using reqwest.
//!
//! Sends resolved `ApiRequest`s to the Wrike API and token endpoint.
//! GET/DELETE parameters travel in the query string, POST/PUT parameters
//! as a form-encoded body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use wrike_application::ports::{ApiRequest, ApiTransport};
use wrike_domain::{ApiResponse, GatewayError, GatewayResult, HttpMethod};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `ApiTransport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestApiTransport {
    client: Client,
}

impl ReqwestApiTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - User-Agent: "wrike-gateway/<version>"
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the client cannot be created.
    pub fn new() -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("wrike-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn build(&self, request: &ApiRequest) -> GatewayResult<reqwest::RequestBuilder> {
        let mut url = Url::parse(&request.url)
            .map_err(|e| GatewayError::Transport(format!("invalid URL {}: {e}", request.url)))?;
        let params = request.encoded_params();

        if !request.method.has_body() && !params.is_empty() {
            url.query_pairs_mut().extend_pairs(&params);
        }

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);

        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        if request.method.has_body() {
            let body = serde_urlencoded::to_string(&params)
                .map_err(|e| GatewayError::Transport(format!("failed to encode form: {e}")))?;
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        Ok(builder)
    }

    fn map_error(error: &reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            return GatewayError::Transport(format!("request timed out: {error}"));
        }
        if error.is_connect() {
            return GatewayError::Transport(format!("connection failed: {error}"));
        }
        GatewayError::Transport(error.to_string())
    }
}

#[async_trait]
impl ApiTransport for ReqwestApiTransport {
    async fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
        let builder = self.build(&request)?;

        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let response = builder.send().await.map_err(|e| Self::map_error(&e))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to read body: {e}")))?;

        tracing::debug!(status, url = %request.url, "received response");
        Ok(ApiResponse::from_text(status, &text))
    }
}
