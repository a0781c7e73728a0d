//! Default adapter wiring

use std::sync::Arc;

use wrike_application::{GatewayConfig, OAuth2Gateway, OAuth2GatewayBuilder};
use wrike_domain::GatewayResult;

use crate::adapters::{LocalCallbackListener, ReqwestApiTransport, SystemBrowser};
use crate::persistence::FileTokenRepository;

/// Returns a builder with the production adapters for `config`: reqwest
/// transport, local callback listener, system browser, and a token file
/// when `config.token_file` is set.
///
/// # Errors
///
/// Returns `GatewayError::Transport` if the HTTP client cannot be created.
pub fn gateway_builder(config: GatewayConfig) -> GatewayResult<OAuth2GatewayBuilder> {
    let transport = Arc::new(ReqwestApiTransport::new()?);
    let listener = Arc::new(LocalCallbackListener::from_config(&config));
    let token_file = config.token_file.clone();

    let mut builder = OAuth2GatewayBuilder::new(config)
        .transport(transport)
        .listener(listener)
        .browser(Arc::new(SystemBrowser::new()));
    if let Some(path) = token_file {
        builder = builder.repository(Arc::new(FileTokenRepository::new(path)));
    }
    Ok(builder)
}

/// Builds a gateway with the production adapters.
///
/// # Errors
///
/// Same as [`gateway_builder`].
pub fn default_gateway(config: GatewayConfig) -> GatewayResult<OAuth2Gateway> {
    gateway_builder(config)?.build()
}
