pub mod http;
pub mod memory;
pub mod types;
pub mod wire;

pub use http::{HttpApiConfig, HttpEndpointApi, DEFAULT_API_URL};
pub use memory::{MemoryEndpointApi, RecordedCall, ServerDefaults};
pub use types::{ApiCall, ApiError, EndpointApi};
pub use wire::*;
