//! Browser-driven authorization-code flow.
//!
//! Binds the callback listener, sends the user's browser to the provider,
//! waits (bounded and cancellable) for the redirect, then trades the code
//! for a token pair.

use std::sync::Arc;

use wrike_domain::{AuthInfo, GatewayError, GatewayResult, token_preview};

use crate::config::GatewayConfig;
use crate::ports::{
    BrowserLauncher, CallbackListener, CancellationReceiver, PendingAuthorization, TokenExchange,
};

/// Result of a completed browser login.
#[derive(Debug)]
pub struct Authorized {
    /// Token pair returned by `get_token`.
    pub auth_info: AuthInfo,
    /// Listener still holding the browser response, in wait-for-redirect
    /// mode only.
    pub pending: Option<PendingAuthorization>,
}

/// Composition of listener, browser trigger and token exchange.
pub struct AuthorizationFlow {
    listener: Arc<dyn CallbackListener>,
    browser: Arc<dyn BrowserLauncher>,
    exchange: Arc<dyn TokenExchange>,
}

impl AuthorizationFlow {
    /// Create a flow from its collaborators.
    #[must_use]
    pub fn new(
        listener: Arc<dyn CallbackListener>,
        browser: Arc<dyn BrowserLauncher>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        Self {
            listener,
            browser,
            exchange,
        }
    }

    /// Runs one complete login.
    ///
    /// Configuration is validated before anything is bound or opened. A
    /// browser that fails to open is logged with the URL and the flow keeps
    /// waiting, so the user can open it by hand.
    ///
    /// # Errors
    ///
    /// - `Configuration` for missing credentials
    /// - `ListenerBind` if the callback port is unavailable
    /// - `MalformedCallback`, `AuthorizationTimeout` or `Cancelled` from the wait
    /// - `TokenExchange` if the code is rejected
    /// - `Cancelled` if `cancel` fires during the exchange
    pub async fn authorize(
        &self,
        config: &GatewayConfig,
        cancel: &mut CancellationReceiver,
    ) -> GatewayResult<Authorized> {
        config.validate()?;
        let auth_url = config.authorization_url()?;

        let mut pending = self.listener.start(config.wait_for_redirect).await?;
        if let Some(addr) = pending.local_addr() {
            tracing::info!(%addr, "callback listener bound");
        }

        match self.browser.open(&auth_url) {
            Ok(()) => tracing::info!("opened browser for authorization"),
            Err(e) => tracing::warn!(
                error = %e,
                url = %auth_url,
                "could not open browser, open the URL manually"
            ),
        }

        let code = match pending
            .wait_for_code(config.authorization_timeout(), cancel)
            .await
        {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(error = %e, "authorization aborted");
                pending.stop().await;
                return Err(e);
            }
        };
        tracing::info!(code = %token_preview(&code), "authorization code received");

        let pending = if pending.awaits_redirect() {
            Some(pending)
        } else {
            pending.finish().await;
            None
        };

        let exchanged = tokio::select! {
            result = self.exchange.get_token(
                &config.client_id,
                &config.client_secret,
                &code,
                &config.redirect_uri,
            ) => result,
            () = cancel.cancelled() => Err(GatewayError::Cancelled),
        };

        match exchanged {
            Ok(auth_info) => Ok(Authorized { auth_info, pending }),
            Err(e) => {
                if let Some(pending) = pending {
                    pending.finish().await;
                }
                Err(e)
            }
        }
    }
}
