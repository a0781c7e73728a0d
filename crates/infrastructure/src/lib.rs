//! Wrike Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, configuration loading, and the
//! default wiring of both into a gateway.

pub mod adapters;
pub mod persistence;
pub mod serialization;
pub mod settings;
mod wiring;

pub use adapters::{LocalCallbackListener, PrintingBrowser, ReqwestApiTransport, SystemBrowser};
pub use persistence::FileTokenRepository;
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
pub use settings::{ConfigError, ConfigLoader};
pub use wiring::{default_gateway, gateway_builder};
