//! Reconciliation of declared inference endpoints against the control plane.

pub mod drift;
pub mod error;
pub mod mapping;
pub mod reconciler;

pub use drift::{assess, Phase};
pub use error::{MappingError, Operation, ReconcileError};
pub use mapping::{to_create_request, to_desired_state, to_update_request};
pub use reconciler::Reconciler;
