//! Wrike Domain - Core gateway types
//!
//! This crate defines the domain model for the Wrike OAuth2 gateway.
//! All types here are pure Rust with no I/O dependencies.

pub mod api;
pub mod auth;
pub mod error;

pub use api::{
    ApiCall, ApiDescriptor, ApiRegistry, ApiResponse, HttpMethod, StatusCode, token_registry,
    wrike_registry,
};
pub use auth::{AuthInfo, CallbackOutcome, GatewayState, token_preview};
pub use error::{GatewayError, GatewayResult};
