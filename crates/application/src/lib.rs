//! Wrike Application - Ports and gateway orchestration
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for external dependencies)
//! - Token storage and the browser authorization flow
//! - The authenticated call wrapper

pub mod auth;
pub mod config;
pub mod gateway;
pub mod ports;

pub use auth::{AuthorizationFlow, TokenEndpointClient, TokenStore};
pub use config::GatewayConfig;
pub use gateway::{BlockingGateway, OAuth2Gateway, OAuth2GatewayBuilder};
pub use ports::{
    ApiRequest, ApiTransport, BrowserLauncher, CallbackListener, CancellationReceiver,
    CancellationToken, PendingAuthorization, TokenExchange, TokenRepository, TokensObserver,
};
