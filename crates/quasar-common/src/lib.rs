pub mod endpoint;
pub mod image;
pub mod tristate;
pub mod validate;

pub mod telemetry;

pub use endpoint::{Actor, Cloud, Compute, Endpoint, EndpointStatus, Measure, Model, PrivateService, Scaling};
pub use image::{
    Credentials, CustomImage, HuggingfaceImage, Image, ImageKind, LlamacppImage, ServerConfig,
    TeiImage, TgiImage, TgiNeuronImage, TgiTpuImage, VllmImage,
};
pub use tristate::{Tristate, UNKNOWN_MARKER};
pub use validate::{validate_name, ValidationError};
