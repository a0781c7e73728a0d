//! Authentication module for the Wrike gateway.
//!
//! This module provides:
//! - The token store (in-memory copy over a durable record)
//! - The token endpoint client (`get_token` / `refresh_token`)
//! - The browser-driven authorization flow

mod exchange;
mod flow;
mod token_store;

pub use exchange::TokenEndpointClient;
pub use flow::{AuthorizationFlow, Authorized};
pub use token_store::TokenStore;
