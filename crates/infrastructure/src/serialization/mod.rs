//! Deterministic JSON for the token file.
//!
//! Token files are written with sorted keys, 2-space indentation and a
//! trailing newline so repeated writes of the same pair are byte-identical.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
