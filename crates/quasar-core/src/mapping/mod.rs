pub mod image;
pub mod inbound;
pub mod outbound;

pub use image::{image_from_remote, image_to_remote};
pub use inbound::to_desired_state;
pub use outbound::{to_create_request, to_update_request};
