//! API operation descriptors, calls and responses

mod descriptor;
mod method;
mod registry;
mod response;

pub use descriptor::{ApiCall, ApiDescriptor, ApiRegistry};
pub use method::HttpMethod;
pub use registry::{token_registry, wrike_registry};
pub use response::{ApiResponse, StatusCode};
