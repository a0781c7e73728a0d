//! Local callback listener port
//!
//! The listener binds the redirect address, serves exactly one request and
//! hands the captured authorization code back through a one-shot channel.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wrike_domain::{CallbackOutcome, GatewayError, GatewayResult};

use super::CancellationReceiver;

/// Port for the single-request redirect listener.
#[async_trait]
pub trait CallbackListener: Send + Sync {
    /// Binds the callback address and starts serving one request in the
    /// background.
    ///
    /// With `wait_for_redirect`, the response to the browser is held back
    /// until `PendingAuthorization::redirect` supplies a location.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ListenerBind` if the address cannot be bound.
    /// Bind failures are not retried.
    async fn start(&self, wait_for_redirect: bool) -> GatewayResult<PendingAuthorization>;
}

/// One in-flight browser authorization.
///
/// Holds the write-once code handoff from the listener task, the optional
/// redirect slot, and the task handle. Dropping it aborts the listener.
#[derive(Debug)]
pub struct PendingAuthorization {
    local_addr: Option<SocketAddr>,
    outcome: Option<oneshot::Receiver<CallbackOutcome>>,
    redirect: Option<oneshot::Sender<String>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PendingAuthorization {
    /// Wraps the receiving end of the code handoff.
    #[must_use]
    pub const fn new(outcome: oneshot::Receiver<CallbackOutcome>) -> Self {
        Self {
            local_addr: None,
            outcome: Some(outcome),
            redirect: None,
            shutdown: None,
            task: None,
        }
    }

    /// Records the address the listener is bound to.
    #[must_use]
    pub const fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Attaches the redirect slot used in wait-for-redirect mode.
    #[must_use]
    pub fn with_redirect(mut self, redirect: oneshot::Sender<String>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Attaches the listener task and its shutdown signal.
    #[must_use]
    pub fn with_task(mut self, task: JoinHandle<()>, shutdown: oneshot::Sender<()>) -> Self {
        self.task = Some(task);
        self.shutdown = Some(shutdown);
        self
    }

    /// Address the listener is bound to, if known.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Returns true if the browser response is waiting for a redirect.
    #[must_use]
    pub const fn awaits_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    /// Waits for the listener to capture a code.
    ///
    /// # Errors
    ///
    /// - `MalformedCallback` if the request carried no code
    /// - `AuthorizationTimeout` if nothing arrived within `timeout`
    /// - `Cancelled` if `cancel` fired first
    /// - `Transport` if the listener stopped without a result
    pub async fn wait_for_code(
        &mut self,
        timeout: Duration,
        cancel: &mut CancellationReceiver,
    ) -> GatewayResult<String> {
        let outcome = self.outcome.take().ok_or_else(|| {
            GatewayError::Transport("authorization code was already consumed".to_string())
        })?;

        let received = tokio::select! {
            result = tokio::time::timeout(timeout, outcome) => result,
            () = cancel.cancelled() => return Err(GatewayError::Cancelled),
        };

        match received {
            Err(_) => Err(GatewayError::AuthorizationTimeout {
                after_secs: timeout.as_secs(),
            }),
            Ok(Err(_)) => Err(GatewayError::Transport(
                "callback listener stopped before receiving a request".to_string(),
            )),
            Ok(Ok(CallbackOutcome::Code(code))) => Ok(code),
            Ok(Ok(CallbackOutcome::Malformed)) => Err(GatewayError::MalformedCallback),
        }
    }

    /// Completes a held browser response with a redirect to `location` and
    /// joins the listener. Returns false if no response was waiting.
    pub async fn redirect(mut self, location: impl Into<String>) -> bool {
        let sent = self
            .redirect
            .take()
            .is_some_and(|slot| slot.send(location.into()).is_ok());
        self.join().await;
        sent
    }

    /// Joins the listener once it has answered its request. A held
    /// response is released with the plain confirmation page.
    pub async fn finish(mut self) {
        self.redirect = None;
        self.join().await;
    }

    /// Signals the listener to stop without serving and joins it.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.join().await;
    }

    async fn join(&mut self) {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "callback listener task failed");
        }
    }
}

impl Drop for PendingAuthorization {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
