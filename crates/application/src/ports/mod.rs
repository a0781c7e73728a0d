//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the gateway core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod api_transport;
mod browser;
mod callback_listener;
mod cancellation;
mod token_exchange;
mod token_repository;

pub use api_transport::{ApiRequest, ApiTransport};
pub use browser::BrowserLauncher;
pub use callback_listener::{CallbackListener, PendingAuthorization};
pub use cancellation::{CancellationReceiver, CancellationToken};
pub use token_exchange::TokenExchange;
pub use token_repository::{TokenRepository, TokensObserver};
