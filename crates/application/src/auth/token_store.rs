//! In-memory token holder backed by an optional durable record.
//!
//! Saving an unchanged token pair is a no-op: nothing is written and the
//! observer is not notified.

use std::sync::Arc;
use tokio::sync::RwLock;
use wrike_domain::{AuthInfo, GatewayResult, token_preview};

use crate::ports::{TokenRepository, TokensObserver};

/// Thread-safe holder of the current token pair.
#[derive(Clone, Default)]
pub struct TokenStore {
    current: Arc<RwLock<Option<AuthInfo>>>,
    repository: Option<Arc<dyn TokenRepository>>,
    observer: Option<Arc<dyn TokensObserver>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_repository", &self.repository.is_some())
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Create a memory-only store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store persisted through `repository`.
    #[must_use]
    pub fn with_repository(repository: Arc<dyn TokenRepository>) -> Self {
        Self {
            repository: Some(repository),
            ..Self::default()
        }
    }

    /// Register an observer notified of every persisted change.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TokensObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the held token pair, reading the durable record on first use.
    ///
    /// A pair read from the record is cached but not rewritten.
    ///
    /// # Errors
    ///
    /// Propagates `GatewayError::TokenStorage` from the repository.
    pub async fn load(&self) -> GatewayResult<Option<AuthInfo>> {
        if let Some(current) = self.current.read().await.clone() {
            return Ok(Some(current));
        }

        let Some(repository) = &self.repository else {
            return Ok(None);
        };

        let mut current = self.current.write().await;
        if current.is_none() {
            *current = repository.load().await?;
            if let Some(info) = current.as_ref() {
                tracing::debug!(
                    access_token = %token_preview(&info.access_token),
                    "loaded stored token"
                );
            }
        }
        Ok(current.clone())
    }

    /// Returns the held token pair without touching the durable record.
    pub async fn current(&self) -> Option<AuthInfo> {
        self.current.read().await.clone()
    }

    /// Replaces the held token pair.
    ///
    /// Returns false without any I/O when `auth_info` equals the held pair.
    /// Otherwise writes the durable record, updates memory, notifies the
    /// observer and returns true.
    ///
    /// # Errors
    ///
    /// Propagates `GatewayError::TokenStorage`; memory is left unchanged.
    pub async fn save(&self, auth_info: AuthInfo) -> GatewayResult<bool> {
        let mut current = self.current.write().await;
        if current.as_ref() == Some(&auth_info) {
            return Ok(false);
        }

        if let Some(repository) = &self.repository {
            repository.save(&auth_info).await?;
        }

        tracing::info!(
            access_token = %token_preview(&auth_info.access_token),
            "stored new token"
        );

        if let Some(observer) = &self.observer {
            observer.new_tokens(&auth_info.refresh_token, &auth_info.access_token);
        }
        *current = Some(auth_info);
        drop(current);

        Ok(true)
    }

    /// Forgets the held pair and removes the durable record.
    ///
    /// # Errors
    ///
    /// Propagates `GatewayError::TokenStorage` from the repository.
    pub async fn clear(&self) -> GatewayResult<()> {
        let mut current = self.current.write().await;
        if let Some(repository) = &self.repository {
            repository.clear().await?;
        }
        *current = None;
        drop(current);
        Ok(())
    }
}
