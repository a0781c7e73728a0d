//! Gateway assembly

use std::sync::Arc;

use wrike_domain::{ApiRegistry, GatewayError, GatewayResult, wrike_registry};

use super::OAuth2Gateway;
use crate::auth::{AuthorizationFlow, TokenEndpointClient, TokenStore};
use crate::config::GatewayConfig;
use crate::ports::{
    ApiTransport, BrowserLauncher, CallbackListener, TokenExchange, TokenRepository,
    TokensObserver,
};

/// Builder wiring adapters into an `OAuth2Gateway`.
///
/// Transport, callback listener and browser are required. The token
/// exchange defaults to a `TokenEndpointClient` over the same transport,
/// the registry to the Wrike v4 table, and storage to memory only.
#[must_use]
pub struct OAuth2GatewayBuilder {
    config: GatewayConfig,
    registry: Option<ApiRegistry>,
    transport: Option<Arc<dyn ApiTransport>>,
    exchange: Option<Arc<dyn TokenExchange>>,
    listener: Option<Arc<dyn CallbackListener>>,
    browser: Option<Arc<dyn BrowserLauncher>>,
    repository: Option<Arc<dyn TokenRepository>>,
    observer: Option<Arc<dyn TokensObserver>>,
}

impl OAuth2GatewayBuilder {
    /// Starts a builder for `config`.
    pub const fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            registry: None,
            transport: None,
            exchange: None,
            listener: None,
            browser: None,
            repository: None,
            observer: None,
        }
    }

    /// Replaces the operation table.
    pub fn registry(mut self, registry: ApiRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the transport used for API calls.
    pub fn transport(mut self, transport: Arc<dyn ApiTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Overrides the token exchange.
    pub fn token_exchange(mut self, exchange: Arc<dyn TokenExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Sets the callback listener.
    pub fn listener(mut self, listener: Arc<dyn CallbackListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the browser launcher.
    pub fn browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Persists tokens through `repository`.
    pub fn repository(mut self, repository: Arc<dyn TokenRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Registers a token observer.
    pub fn observer(mut self, observer: Arc<dyn TokensObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Assembles the gateway.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` if a required adapter is
    /// missing.
    pub fn build(self) -> GatewayResult<OAuth2Gateway> {
        let transport = self.transport.ok_or_else(|| missing("API transport"))?;
        let listener = self.listener.ok_or_else(|| missing("callback listener"))?;
        let browser = self.browser.ok_or_else(|| missing("browser launcher"))?;

        let exchange = self.exchange.unwrap_or_else(|| {
            Arc::new(TokenEndpointClient::new(
                Arc::clone(&transport),
                self.config.token_url.clone(),
            ))
        });

        let mut store = self
            .repository
            .map_or_else(TokenStore::new, TokenStore::with_repository);
        if let Some(observer) = self.observer {
            store = store.with_observer(observer);
        }

        let flow = AuthorizationFlow::new(listener, browser, Arc::clone(&exchange));

        Ok(OAuth2Gateway::new(
            self.config,
            self.registry.unwrap_or_else(wrike_registry),
            transport,
            exchange,
            flow,
            store,
        ))
    }
}

fn missing(what: &str) -> GatewayError {
    GatewayError::Configuration(format!("no {what} configured"))
}
