//! Authentication domain types

pub mod constants;
mod types;

pub use types::{AuthInfo, CallbackOutcome, GatewayState, token_preview};
