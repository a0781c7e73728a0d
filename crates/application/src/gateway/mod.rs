//! Authenticated call wrapper
//!
//! `OAuth2Gateway` resolves symbolic operations, attaches the bearer token
//! and recovers from one `not_authorized` response per call by refreshing.

mod blocking;
mod builder;
mod oauth2;

pub use blocking::BlockingGateway;
pub use builder::OAuth2GatewayBuilder;
pub use oauth2::OAuth2Gateway;
