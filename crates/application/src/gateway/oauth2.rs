//! `OAuth2Gateway` state machine

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, watch};
use wrike_domain::{
    ApiCall, ApiRegistry, ApiResponse, AuthInfo, GatewayError, GatewayResult, GatewayState,
    HttpMethod, token_preview,
};

use crate::auth::{AuthorizationFlow, Authorized, TokenStore};
use crate::config::GatewayConfig;
use crate::ports::{
    ApiRequest, ApiTransport, CancellationReceiver, PendingAuthorization, TokenExchange,
};

/// Authenticated entry point to the Wrike API.
///
/// Every call is resolved through the operation registry, sent with the
/// current bearer token, and retried at most once after a refresh when the
/// API answers `401 not_authorized`. Any other status is returned to the
/// caller untouched.
///
/// Authorization and refresh are serialised by one async mutex per
/// instance. Nothing is locked across processes sharing a token file.
pub struct OAuth2Gateway {
    config: GatewayConfig,
    registry: ApiRegistry,
    transport: Arc<dyn ApiTransport>,
    exchange: Arc<dyn TokenExchange>,
    flow: AuthorizationFlow,
    store: TokenStore,
    state: watch::Sender<GatewayState>,
    auth_guard: Mutex<()>,
    pending: Mutex<Option<PendingAuthorization>>,
}

impl std::fmt::Debug for OAuth2Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Gateway")
            .field("state", &self.state())
            .field("operations", &self.registry.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl OAuth2Gateway {
    pub(super) fn new(
        config: GatewayConfig,
        registry: ApiRegistry,
        transport: Arc<dyn ApiTransport>,
        exchange: Arc<dyn TokenExchange>,
        flow: AuthorizationFlow,
        store: TokenStore,
    ) -> Self {
        Self {
            config,
            registry,
            transport,
            exchange,
            flow,
            store,
            state: watch::Sender::new(GatewayState::Unauthenticated),
            auth_guard: Mutex::new(()),
            pending: Mutex::new(None),
        }
    }

    /// Current authentication state.
    #[must_use]
    pub fn state(&self) -> GatewayState {
        *self.state.borrow()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<GatewayState> {
        self.state.subscribe()
    }

    /// Configuration this gateway was built with.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Operation table used to resolve calls.
    #[must_use]
    pub const fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    /// Token pair currently held in memory.
    pub async fn auth_info(&self) -> Option<AuthInfo> {
        self.store.current().await
    }

    /// Invokes `call` with authentication attached.
    ///
    /// # Errors
    ///
    /// See [`Self::call_with_cancellation`].
    pub async fn call(&self, call: ApiCall) -> GatewayResult<ApiResponse> {
        self.call_with_cancellation(call, CancellationReceiver::never())
            .await
    }

    /// Invokes `call`, aborting with `GatewayError::Cancelled` when `cancel`
    /// fires.
    ///
    /// Obtains a token first if none is held: from the durable record, or
    /// else through the browser flow. Non-2xx statuses other than
    /// `401 not_authorized` are returned as `Ok`.
    ///
    /// # Errors
    ///
    /// - `Configuration`, `UnknownApi`, `MissingPathArgument` before any I/O
    /// - errors of the browser flow when a login is needed
    /// - `TokenExchange` if the refresh is rejected
    /// - `AuthenticationFailed` if the retried call is still rejected
    /// - `Transport`, `TokenStorage`, `Cancelled`
    pub async fn call_with_cancellation(
        &self,
        call: ApiCall,
        mut cancel: CancellationReceiver,
    ) -> GatewayResult<ApiResponse> {
        self.config.validate()?;
        let descriptor = self.registry.get(&call.name)?;
        let path = descriptor.render_path(&call.name, &call.path_args)?;
        let params = descriptor.merged_params(&call.params);
        let method = descriptor.method;

        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let auth_info = self.ensure_authenticated(&mut cancel).await?;
        let response = self
            .send(method, &path, &params, &auth_info, &mut cancel)
            .await?;
        tracing::debug!(api = %call.name, status = %response.status, "API call completed");

        if !response.is_not_authorized() {
            return Ok(response);
        }

        tracing::info!(api = %call.name, "access token rejected, refreshing");
        let refreshed = self.refresh(&auth_info, &mut cancel).await?;
        let retried = self
            .send(method, &path, &params, &refreshed, &mut cancel)
            .await?;

        if retried.is_not_authorized() {
            tracing::warn!(api = %call.name, "access token rejected after refresh");
            return Err(GatewayError::AuthenticationFailed {
                status: retried.status.as_u16(),
                body: retried.body_text(),
            });
        }

        tracing::info!(api = %call.name, status = %retried.status, "retry after refresh completed");
        Ok(retried)
    }

    /// Returns the held token pair, running the browser flow if there is
    /// none.
    ///
    /// # Errors
    ///
    /// Same as the authorization part of [`Self::call_with_cancellation`].
    pub async fn login(&self, mut cancel: CancellationReceiver) -> GatewayResult<AuthInfo> {
        self.config.validate()?;
        self.ensure_authenticated(&mut cancel).await
    }

    /// Completes a held browser response with a redirect to `location`.
    ///
    /// Only meaningful in wait-for-redirect mode after a login. Returns
    /// false if no response is waiting.
    pub async fn redirect(&self, location: &str) -> bool {
        let pending = self.pending.lock().await.take();
        match pending {
            Some(pending) => {
                let sent = pending.redirect(location).await;
                tracing::info!(location, sent, "redirected browser");
                sent
            }
            None => {
                tracing::warn!(location, "no browser response is waiting for a redirect");
                false
            }
        }
    }

    /// Installs `auth_info` as the current token pair.
    ///
    /// Returns false if it equals the held pair, in which case nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Propagates `GatewayError::TokenStorage`.
    pub async fn set_auth_info(&self, auth_info: AuthInfo) -> GatewayResult<bool> {
        let _guard = self.auth_guard.lock().await;
        let changed = self.store.save(auth_info).await?;
        self.transition(GatewayState::Authenticated);
        Ok(changed)
    }

    /// Forgets the token pair and removes the durable record.
    ///
    /// # Errors
    ///
    /// Propagates `GatewayError::TokenStorage`.
    pub async fn logout(&self) -> GatewayResult<()> {
        let _guard = self.auth_guard.lock().await;
        if let Some(pending) = self.pending.lock().await.take() {
            pending.finish().await;
        }
        self.store.clear().await?;
        self.transition(GatewayState::Unauthenticated);
        tracing::info!("logged out");
        Ok(())
    }

    async fn ensure_authenticated(
        &self,
        cancel: &mut CancellationReceiver,
    ) -> GatewayResult<AuthInfo> {
        if let Some(auth_info) = self.store.load().await? {
            self.mark_authenticated();
            return Ok(auth_info);
        }

        let _guard = self.auth_guard.lock().await;
        if let Some(auth_info) = self.store.current().await {
            return Ok(auth_info);
        }

        self.transition(GatewayState::Authenticating);
        let authorized = self.flow.authorize(&self.config, cancel).await;
        let Authorized { auth_info, pending } = match authorized {
            Ok(authorized) => authorized,
            Err(e) => {
                self.transition(GatewayState::Unauthenticated);
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(auth_info.clone()).await {
            self.transition(GatewayState::Unauthenticated);
            return Err(e);
        }
        *self.pending.lock().await = pending;
        self.transition(GatewayState::Authenticated);
        tracing::info!(
            access_token = %token_preview(&auth_info.access_token),
            "authorization completed"
        );
        Ok(auth_info)
    }

    async fn refresh(
        &self,
        stale: &AuthInfo,
        cancel: &mut CancellationReceiver,
    ) -> GatewayResult<AuthInfo> {
        let _guard = self.auth_guard.lock().await;

        // Another call may have refreshed while this one waited for the guard.
        if let Some(current) = self.store.current().await
            && current.access_token != stale.access_token
        {
            tracing::debug!("token already refreshed by a concurrent call");
            return Ok(current);
        }

        if stale.refresh_token.is_empty() {
            return Err(GatewayError::AuthenticationFailed {
                status: 401,
                body: "no refresh token available".to_string(),
            });
        }

        self.transition(GatewayState::Refreshing);
        let refreshed = tokio::select! {
            result = self.exchange.refresh_token(
                &self.config.client_id,
                &self.config.client_secret,
                &stale.refresh_token,
            ) => result,
            () = cancel.cancelled() => Err(GatewayError::Cancelled),
        };
        let saved = match refreshed {
            Ok(auth_info) => self.store.save(auth_info.clone()).await.map(|_| auth_info),
            Err(e) => Err(e),
        };
        self.transition(GatewayState::Authenticated);

        if let Err(e) = &saved {
            tracing::warn!(error = %e, "token refresh failed");
        }
        saved
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        params: &BTreeMap<String, Value>,
        auth_info: &AuthInfo,
        cancel: &mut CancellationReceiver,
    ) -> GatewayResult<ApiResponse> {
        let url = format!("{}{path}", auth_info.api_base_url(&self.config.api_base_url));
        let request = ApiRequest::new(method, url)
            .with_authorization(auth_info.authorization_header())
            .with_params(params.clone());

        tokio::select! {
            response = self.transport.execute(request) => response,
            () = cancel.cancelled() => Err(GatewayError::Cancelled),
        }
    }

    fn mark_authenticated(&self) {
        if self.state() == GatewayState::Unauthenticated {
            self.transition(GatewayState::Authenticated);
        }
    }

    fn transition(&self, next: GatewayState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            if !previous.can_transition_to(next) {
                tracing::debug!(?previous, ?next, "unexpected state transition");
            }
            tracing::debug!(state = next.message(), "gateway state changed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::OAuth2GatewayBuilder;
    use crate::ports::{
        BrowserLauncher, CallbackListener, CancellationToken, TokenRepository, TokensObserver,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;
    use wrike_domain::{ApiDescriptor, CallbackOutcome};

    /// Shared ordered log of side effects across doubles.
    type EventLog = Arc<StdMutex<Vec<String>>>;

    /// Transport double replaying queued responses.
    struct QueuedTransport {
        responses: StdMutex<VecDeque<ApiResponse>>,
        fallback: Option<ApiResponse>,
        requests: StdMutex<Vec<ApiRequest>>,
        events: EventLog,
    }

    impl QueuedTransport {
        fn new(events: &EventLog, responses: Vec<ApiResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(responses.into()),
                fallback: None,
                requests: StdMutex::new(Vec::new()),
                events: Arc::clone(events),
            })
        }

        fn always(events: &EventLog, response: ApiResponse) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(VecDeque::new()),
                fallback: Some(response),
                requests: StdMutex::new(Vec::new()),
                events: Arc::clone(events),
            })
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiTransport for QueuedTransport {
        async fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
            self.events.lock().unwrap().push("api".to_string());
            self.requests.lock().unwrap().push(request);
            let next = self.responses.lock().unwrap().pop_front();
            next.or_else(|| self.fallback.clone())
                .ok_or_else(|| GatewayError::Transport("no scripted response".to_string()))
        }
    }

    /// Token exchange double issuing B/R2 on refresh.
    struct FakeExchange {
        logins: AtomicUsize,
        refreshes: AtomicUsize,
        refreshed: AuthInfo,
        stall_refresh: bool,
        events: EventLog,
    }

    impl FakeExchange {
        fn new(events: &EventLog) -> Arc<Self> {
            Arc::new(Self {
                logins: AtomicUsize::new(0),
                refreshes: AtomicUsize::new(0),
                refreshed: AuthInfo::new("B", "R2"),
                stall_refresh: false,
                events: Arc::clone(events),
            })
        }

        /// Refresh that never answers, like a hung token endpoint.
        fn stalling(events: &EventLog) -> Arc<Self> {
            Arc::new(Self {
                logins: AtomicUsize::new(0),
                refreshes: AtomicUsize::new(0),
                refreshed: AuthInfo::new("B", "R2"),
                stall_refresh: true,
                events: Arc::clone(events),
            })
        }
    }

    #[async_trait]
    impl TokenExchange for FakeExchange {
        async fn get_token(
            &self,
            _client_id: &str,
            _client_secret: &str,
            code: &str,
            _redirect_uri: &str,
        ) -> GatewayResult<AuthInfo> {
            self.events.lock().unwrap().push(format!("get_token:{code}"));
            self.logins.fetch_add(1, Ordering::SeqCst);
            Ok(AuthInfo::new("A", "R"))
        }

        async fn refresh_token(
            &self,
            _client_id: &str,
            _client_secret: &str,
            refresh_token: &str,
        ) -> GatewayResult<AuthInfo> {
            self.events
                .lock()
                .unwrap()
                .push(format!("refresh_token:{refresh_token}"));
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.stall_refresh {
                std::future::pending::<()>().await;
            }
            Ok(self.refreshed.clone())
        }
    }

    /// Listener double delivering a code as soon as it is started.
    struct InstantListener {
        events: EventLog,
    }

    #[async_trait]
    impl CallbackListener for InstantListener {
        async fn start(&self, wait_for_redirect: bool) -> GatewayResult<PendingAuthorization> {
            self.events.lock().unwrap().push("listen".to_string());
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(CallbackOutcome::Code("abc123".to_string()));
            let mut pending = PendingAuthorization::new(rx);
            if wait_for_redirect {
                let (redirect_tx, redirect_rx) = oneshot::channel::<String>();
                let events = Arc::clone(&self.events);
                tokio::spawn(async move {
                    if let Ok(location) = redirect_rx.await {
                        events.lock().unwrap().push(format!("redirect:{location}"));
                    }
                });
                pending = pending.with_redirect(redirect_tx);
            }
            Ok(pending)
        }
    }

    /// Listener double that never receives a request.
    struct SilentListener;

    #[async_trait]
    impl CallbackListener for SilentListener {
        async fn start(&self, _wait_for_redirect: bool) -> GatewayResult<PendingAuthorization> {
            let (tx, rx) = oneshot::channel();
            std::mem::forget(tx);
            Ok(PendingAuthorization::new(rx))
        }
    }

    struct LoggingBrowser {
        events: EventLog,
    }

    impl BrowserLauncher for LoggingBrowser {
        fn open(&self, url: &str) -> GatewayResult<()> {
            assert!(url.contains("response_type=code"));
            self.events.lock().unwrap().push("browser".to_string());
            Ok(())
        }
    }

    /// Repository double with a write counter.
    #[derive(Default)]
    struct MemoryRepository {
        stored: StdMutex<Option<AuthInfo>>,
        writes: AtomicUsize,
    }

    impl MemoryRepository {
        fn holding(info: AuthInfo) -> Arc<Self> {
            Arc::new(Self {
                stored: StdMutex::new(Some(info)),
                writes: AtomicUsize::new(0),
            })
        }

        fn stored(&self) -> Option<AuthInfo> {
            self.stored.lock().unwrap().clone()
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenRepository for MemoryRepository {
        async fn load(&self) -> GatewayResult<Option<AuthInfo>> {
            Ok(self.stored())
        }

        async fn save(&self, auth_info: &AuthInfo) -> GatewayResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = Some(auth_info.clone());
            Ok(())
        }

        async fn clear(&self) -> GatewayResult<()> {
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        seen: StdMutex<Vec<(String, String)>>,
    }

    impl TokensObserver for RecordingObserver {
        fn new_tokens(&self, refresh_token: &str, access_token: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((refresh_token.to_string(), access_token.to_string()));
        }
    }

    fn not_authorized() -> ApiResponse {
        ApiResponse::new(
            401u16,
            json!({"error": "not_authorized", "errorDescription": "Access token is invalid"}),
        )
    }

    fn ok() -> ApiResponse {
        ApiResponse::new(200u16, json!({"kind": "folders", "data": []}))
    }

    fn registry() -> ApiRegistry {
        wrike_domain::wrike_registry().with("whatever", ApiDescriptor::get("/whatever"))
    }

    struct Harness {
        events: EventLog,
        transport: Arc<QueuedTransport>,
        exchange: Arc<FakeExchange>,
        repository: Arc<MemoryRepository>,
        gateway: OAuth2Gateway,
    }

    fn harness(
        config: GatewayConfig,
        repository: Arc<MemoryRepository>,
        transport: impl FnOnce(&EventLog) -> Arc<QueuedTransport>,
    ) -> Harness {
        let events: EventLog = Arc::default();
        let transport = transport(&events);
        let exchange = FakeExchange::new(&events);
        let gateway = OAuth2GatewayBuilder::new(config)
            .registry(registry())
            .transport(transport.clone())
            .token_exchange(exchange.clone())
            .listener(Arc::new(InstantListener {
                events: Arc::clone(&events),
            }))
            .browser(Arc::new(LoggingBrowser {
                events: Arc::clone(&events),
            }))
            .repository(repository.clone())
            .build()
            .unwrap();
        Harness {
            events,
            transport,
            exchange,
            repository,
            gateway,
        }
    }

    fn config() -> GatewayConfig {
        GatewayConfig::new("cid", "secret", "http://localhost:19877")
    }

    #[tokio::test]
    async fn test_fresh_process_runs_browser_flow_before_call() {
        let h = harness(config(), Arc::default(), |events| {
            QueuedTransport::new(events, vec![ok()])
        });

        let response = h.gateway.call(ApiCall::new("whatever")).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(
            *h.events.lock().unwrap(),
            vec!["listen", "browser", "get_token:abc123", "api"]
        );
        assert_eq!(h.exchange.logins.load(Ordering::SeqCst), 1);
        assert_eq!(h.repository.stored(), Some(AuthInfo::new("A", "R")));
        assert_eq!(h.gateway.state(), GatewayState::Authenticated);
        assert_eq!(
            h.transport.requests()[0].authorization.as_deref(),
            Some("bearer A")
        );
    }

    #[tokio::test]
    async fn test_stored_token_skips_flow_and_write() {
        let repository = MemoryRepository::holding(AuthInfo::new("A", "R"));
        let h = harness(config(), repository, |events| {
            QueuedTransport::new(events, vec![ok()])
        });

        let response = h.gateway.call(ApiCall::new("whatever")).await.unwrap();

        assert!(response.is_success());
        assert_eq!(*h.events.lock().unwrap(), vec!["api"]);
        assert_eq!(h.repository.writes(), 0);
        assert_eq!(h.repository.stored(), Some(AuthInfo::new("A", "R")));
    }

    #[tokio::test]
    async fn test_not_authorized_refreshes_and_retries_once() {
        let repository = MemoryRepository::holding(AuthInfo::new("A", "R"));
        let h = harness(config(), repository, |events| {
            QueuedTransport::new(events, vec![not_authorized(), ok()])
        });

        let response = h.gateway.call(ApiCall::new("whatever")).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(
            *h.events.lock().unwrap(),
            vec!["api", "refresh_token:R", "api"]
        );
        assert_eq!(h.repository.stored(), Some(AuthInfo::new("B", "R2")));
        assert_eq!(h.repository.writes(), 1);
        let requests = h.transport.requests();
        assert_eq!(requests[0].authorization.as_deref(), Some("bearer A"));
        assert_eq!(requests[1].authorization.as_deref(), Some("bearer B"));
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let repository = MemoryRepository::holding(AuthInfo::new("A", "R"));
        let h = harness(config(), repository, |events| {
            QueuedTransport::always(events, not_authorized())
        });

        let err = h.gateway.call(ApiCall::new("whatever")).await.unwrap_err();

        let GatewayError::AuthenticationFailed { status, body } = err else {
            panic!("expected AuthenticationFailed, got {err:?}");
        };
        assert_eq!(status, 401);
        assert!(body.contains("not_authorized"));
        assert_eq!(h.exchange.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(h.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let repository = MemoryRepository::holding(AuthInfo::new("A", "R"));
        let h = harness(config(), repository, |events| {
            QueuedTransport::new(
                events,
                vec![
                    ApiResponse::new(401u16, json!({"error": "invalid_request"})),
                    ApiResponse::new(404u16, json!({"error": "resource_not_found"})),
                ],
            )
        });

        let response = h.gateway.call(ApiCall::new("whatever")).await.unwrap();
        assert_eq!(response.status.as_u16(), 401);
        let response = h.gateway.call(ApiCall::new("whatever")).await.unwrap();
        assert_eq!(response.status.as_u16(), 404);
        assert_eq!(h.exchange.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolves_path_host_and_params() {
        let repository =
            MemoryRepository::holding(AuthInfo::new("A", "R").with_field("host", "app-eu.wrike.com"));
        let h = harness(config(), repository, |events| {
            QueuedTransport::new(events, vec![ok()])
        });

        h.gateway
            .call(
                ApiCall::new("create_task")
                    .path_arg("folder_id", "IEAAAA")
                    .param("title", "Plan"),
            )
            .await
            .unwrap();

        let request = &h.transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            "https://app-eu.wrike.com/api/v4/folders/IEAAAA/tasks"
        );
        assert_eq!(request.params["title"], json!("Plan"));
    }

    #[tokio::test]
    async fn test_call_errors_before_any_io() {
        let h = harness(config(), Arc::default(), |events| {
            QueuedTransport::new(events, vec![])
        });

        let err = h.gateway.call(ApiCall::new("nope")).await.unwrap_err();
        assert_eq!(err, GatewayError::UnknownApi("nope".to_string()));

        let err = h.gateway.call(ApiCall::new("task")).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingPathArgument { .. }));

        assert!(h.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_fast() {
        let h = harness(
            GatewayConfig::new("", "secret", "http://localhost:19877"),
            Arc::default(),
            |events| QueuedTransport::new(events, vec![ok()]),
        );

        let err = h.gateway.call(ApiCall::new("whatever")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
        assert!(h.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_redirect_then_redirect() {
        let mut config = config();
        config.wait_for_redirect = true;
        let h = harness(config, Arc::default(), |events| {
            QueuedTransport::new(events, vec![ok()])
        });

        h.gateway.call(ApiCall::new("whatever")).await.unwrap();
        assert!(h.gateway.redirect("https://example.com/done").await);
        assert!(!h.gateway.redirect("https://example.com/again").await);

        let expected = "redirect:https://example.com/done".to_string();
        for _ in 0..100 {
            if h.events.lock().unwrap().contains(&expected) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(h.events.lock().unwrap().contains(&expected));
    }

    #[tokio::test]
    async fn test_cancellation_stops_waiting_flow() {
        let events: EventLog = Arc::default();
        let gateway = OAuth2GatewayBuilder::new(config())
            .registry(registry())
            .transport(QueuedTransport::new(&events, vec![ok()]))
            .token_exchange(FakeExchange::new(&events))
            .listener(Arc::new(SilentListener))
            .browser(Arc::new(LoggingBrowser {
                events: Arc::clone(&events),
            }))
            .build()
            .unwrap();
        let (token, receiver) = CancellationToken::new();

        let call = gateway.call_with_cancellation(ApiCall::new("whatever"), receiver);
        let cancel = async {
            tokio::task::yield_now().await;
            token.cancel();
        };
        let (result, ()) = tokio::join!(call, cancel);

        assert_eq!(result.unwrap_err(), GatewayError::Cancelled);
        assert_eq!(gateway.state(), GatewayState::Unauthenticated);
        assert_eq!(*events.lock().unwrap(), vec!["browser"]);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_refresh() {
        let events: EventLog = Arc::default();
        let repository = MemoryRepository::holding(AuthInfo::new("A", "R"));
        let gateway = OAuth2GatewayBuilder::new(config())
            .registry(registry())
            .transport(QueuedTransport::new(&events, vec![not_authorized(), ok()]))
            .token_exchange(FakeExchange::stalling(&events))
            .listener(Arc::new(SilentListener))
            .browser(Arc::new(LoggingBrowser {
                events: Arc::clone(&events),
            }))
            .repository(repository.clone())
            .build()
            .unwrap();
        let (token, receiver) = CancellationToken::new();

        let call = gateway.call_with_cancellation(ApiCall::new("whatever"), receiver);
        let cancel = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            token.cancel();
        };
        let (result, ()) = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            tokio::join!(call, cancel)
        })
        .await
        .unwrap();

        assert_eq!(result.unwrap_err(), GatewayError::Cancelled);
        assert_eq!(*events.lock().unwrap(), vec!["api", "refresh_token:R"]);
        assert_eq!(repository.writes(), 0);
        assert_eq!(repository.stored(), Some(AuthInfo::new("A", "R")));
    }

    #[tokio::test]
    async fn test_set_auth_info_and_logout() {
        let observer = Arc::new(RecordingObserver::default());
        let events: EventLog = Arc::default();
        let repository = Arc::new(MemoryRepository::default());
        let gateway = OAuth2GatewayBuilder::new(config())
            .transport(QueuedTransport::new(&events, vec![]))
            .listener(Arc::new(SilentListener))
            .browser(Arc::new(LoggingBrowser {
                events: Arc::clone(&events),
            }))
            .repository(repository.clone())
            .observer(observer.clone())
            .build()
            .unwrap();

        assert!(gateway.set_auth_info(AuthInfo::new("A", "R")).await.unwrap());
        assert!(!gateway.set_auth_info(AuthInfo::new("A", "R")).await.unwrap());
        assert_eq!(gateway.state(), GatewayState::Authenticated);
        assert_eq!(
            *observer.seen.lock().unwrap(),
            vec![("R".to_string(), "A".to_string())]
        );

        gateway.logout().await.unwrap();
        assert_eq!(gateway.state(), GatewayState::Unauthenticated);
        assert_eq!(gateway.auth_info().await, None);
        assert_eq!(repository.stored(), None);
    }

    #[test]
    fn test_build_requires_adapters() {
        let err = OAuth2GatewayBuilder::new(config()).build().unwrap_err();
        assert_eq!(
            err,
            GatewayError::Configuration("no API transport configured".to_string())
        );
    }
}
