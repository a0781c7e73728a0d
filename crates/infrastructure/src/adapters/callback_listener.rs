//! Single-request OAuth2 redirect listener.
//!
//! Binds the redirect port with address reuse, serves the first
//! connection that sends a request line, extracts `code=` from it and
//! answers:
//! - `200` with a short confirmation page,
//! - `301` to an externally supplied location in wait-for-redirect mode,
//! - `406` with no body when no code is present.

use std::net::SocketAddr;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use wrike_application::GatewayConfig;
use wrike_application::ports::{CallbackListener, PendingAuthorization};
use wrike_domain::{CallbackOutcome, GatewayError, GatewayResult, StatusCode};

const CODE_PATTERN: &str = r"code=([\w|\-]+)";
const CONFIRMATION: &str = "Thank you, you can now close this window.";
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// `CallbackListener` serving one request on a local TCP port.
#[derive(Debug, Clone)]
pub struct LocalCallbackListener {
    host: String,
    port: u16,
}

impl LocalCallbackListener {
    /// Creates a listener for `host:port`. Port 0 picks a free port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Creates a listener for the configured callback address.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.callback_host.clone(), config.callback_port)
    }

    async fn bind(&self) -> GatewayResult<TcpListener> {
        let target = format!("{}:{}", self.host, self.port);
        let bind_error = |message: String| GatewayError::ListenerBind {
            addr: target.clone(),
            message,
        };

        let addr = tokio::net::lookup_host(target.as_str())
            .await
            .map_err(|e| bind_error(e.to_string()))?
            .next()
            .ok_or_else(|| bind_error("host did not resolve".to_string()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(|e| bind_error(e.to_string()))?;

        socket
            .set_reuseaddr(true)
            .map_err(|e| bind_error(e.to_string()))?;
        socket.bind(addr).map_err(|e| bind_error(e.to_string()))?;
        socket.listen(8).map_err(|e| bind_error(e.to_string()))
    }
}

#[async_trait]
impl CallbackListener for LocalCallbackListener {
    async fn start(&self, wait_for_redirect: bool) -> GatewayResult<PendingAuthorization> {
        let pattern = Regex::new(CODE_PATTERN)
            .map_err(|e| GatewayError::Configuration(format!("invalid code pattern: {e}")))?;
        let listener = self.bind().await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::ListenerBind {
                addr: format!("{}:{}", self.host, self.port),
                message: e.to_string(),
            })?;

        tracing::info!(addr = %local_addr, wait_for_redirect, "callback listener bound");

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (redirect_tx, redirect_rx) = if wait_for_redirect {
            let (tx, rx) = oneshot::channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let task = tokio::spawn(async move {
            tokio::select! {
                () = serve_one(listener, pattern, outcome_tx, redirect_rx) => {}
                _ = shutdown_rx => tracing::debug!("callback listener stopped"),
            }
        });

        let mut pending = PendingAuthorization::new(outcome_rx)
            .with_local_addr(local_addr)
            .with_task(task, shutdown_tx);
        if let Some(redirect_tx) = redirect_tx {
            pending = pending.with_redirect(redirect_tx);
        }
        Ok(pending)
    }
}

async fn serve_one(
    listener: TcpListener,
    pattern: Regex,
    outcome_tx: oneshot::Sender<CallbackOutcome>,
    redirect_rx: Option<oneshot::Receiver<String>>,
) {
    let Some((mut stream, peer, head)) = accept_request(&listener).await else {
        return;
    };
    drop(listener);

    let outcome = parse_callback(&pattern, &head);
    let response = match &outcome {
        CallbackOutcome::Code(_) => {
            tracing::info!(%peer, "authorization callback received");
            None
        }
        CallbackOutcome::Malformed => {
            tracing::warn!(%peer, "callback request carried no authorization code");
            Some(http_response(StatusCode::new(406), &[], ""))
        }
    };
    let _ = outcome_tx.send(outcome);

    let response = match (response, redirect_rx) {
        (Some(rejection), _) => rejection,
        (None, Some(redirect_rx)) => match redirect_rx.await {
            Ok(location) => http_response(StatusCode::new(301), &[("Location", &location)], ""),
            Err(_) => confirmation(),
        },
        (None, None) => confirmation(),
    };

    if let Err(e) = write_response(&mut stream, &response).await {
        tracing::warn!(%peer, error = %e, "failed to answer callback request");
    }
}

/// Accepts connections until one carries a request line.
///
/// Browsers may preconnect and then close or idle without sending
/// anything. Such connections are read concurrently and never count as
/// the callback; readers still pending are aborted on return.
async fn accept_request(listener: &TcpListener) -> Option<(TcpStream, SocketAddr, String)> {
    let mut readers = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((mut stream, peer)) => {
                    readers.spawn(async move {
                        match read_request_head(&mut stream).await {
                            Ok(head) if has_request_line(&head) => Some((stream, peer, head)),
                            Ok(_) => {
                                tracing::debug!(%peer, "connection closed without a request");
                                None
                            }
                            Err(e) => {
                                tracing::debug!(%peer, error = %e, "failed to read callback request");
                                None
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept callback connection");
                    return None;
                }
            },
            Some(joined) = readers.join_next(), if !readers.is_empty() => {
                if let Ok(Some(request)) = joined {
                    return Some(request);
                }
            }
        }
    }
}

fn has_request_line(head: &str) -> bool {
    head.lines().next().is_some_and(|line| !line.trim().is_empty())
}

/// Extracts the authorization code from the request line.
fn parse_callback(pattern: &Regex, head: &str) -> CallbackOutcome {
    let request_line = head.lines().next().unwrap_or_default();
    pattern
        .captures(request_line)
        .and_then(|captures| captures.get(1))
        .map_or(CallbackOutcome::Malformed, |code| {
            CallbackOutcome::Code(code.as_str().to_string())
        })
}

async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut head = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

async fn write_response(stream: &mut TcpStream, response: &str) -> std::io::Result<()> {
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

fn confirmation() -> String {
    http_response(
        StatusCode::OK,
        &[("Content-Type", "text/plain; charset=utf-8")],
        CONFIRMATION,
    )
}

fn http_response(status: StatusCode, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));
    response
}
