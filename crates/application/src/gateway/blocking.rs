//! Synchronous facade over `OAuth2Gateway`

use tokio::runtime::{Builder, Runtime};
use wrike_domain::{ApiCall, ApiResponse, AuthInfo, GatewayError, GatewayResult};

use super::OAuth2Gateway;
use crate::ports::CancellationReceiver;

/// Blocking wrapper owning its own tokio runtime.
///
/// Must not be used from inside another runtime: `block_on` panics there.
#[derive(Debug)]
pub struct BlockingGateway {
    runtime: Runtime,
    gateway: OAuth2Gateway,
}

impl BlockingGateway {
    /// Wraps `gateway` in a new multi-threaded runtime.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the runtime cannot be created.
    pub fn new(gateway: OAuth2Gateway) -> GatewayResult<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("wrike-gateway")
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to start runtime: {e}")))?;
        Ok(Self { runtime, gateway })
    }

    /// The wrapped async gateway.
    #[must_use]
    pub const fn gateway(&self) -> &OAuth2Gateway {
        &self.gateway
    }

    /// Blocking [`OAuth2Gateway::call`].
    ///
    /// # Errors
    ///
    /// Same as [`OAuth2Gateway::call_with_cancellation`].
    pub fn call(&self, call: ApiCall) -> GatewayResult<ApiResponse> {
        self.runtime.block_on(self.gateway.call(call))
    }

    /// Blocking [`OAuth2Gateway::call_with_cancellation`]. The paired
    /// `CancellationToken` may be triggered from any thread.
    ///
    /// # Errors
    ///
    /// Same as [`OAuth2Gateway::call_with_cancellation`].
    pub fn call_with_cancellation(
        &self,
        call: ApiCall,
        cancel: CancellationReceiver,
    ) -> GatewayResult<ApiResponse> {
        self.runtime
            .block_on(self.gateway.call_with_cancellation(call, cancel))
    }

    /// Blocking [`OAuth2Gateway::login`].
    ///
    /// # Errors
    ///
    /// Same as [`OAuth2Gateway::login`].
    pub fn login(&self, cancel: CancellationReceiver) -> GatewayResult<AuthInfo> {
        self.runtime.block_on(self.gateway.login(cancel))
    }

    /// Blocking [`OAuth2Gateway::redirect`].
    pub fn redirect(&self, location: &str) -> bool {
        self.runtime.block_on(self.gateway.redirect(location))
    }

    /// Blocking [`OAuth2Gateway::logout`].
    ///
    /// # Errors
    ///
    /// Same as [`OAuth2Gateway::logout`].
    pub fn logout(&self) -> GatewayResult<()> {
        self.runtime.block_on(self.gateway.logout())
    }
}
