use std::fmt;

use thiserror::Error;

use quasar_api::ApiError;
use quasar_common::ImageKind;

/// Remote data that cannot be represented in the canonical model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("remote image has no engine populated")]
    NoImage,

    #[error("remote image has several engines populated: {}", join_kinds(.0))]
    MultipleImages(Vec<ImageKind>),
}

fn join_kinds(kinds: &[ImageKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lifecycle step an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{op} endpoint '{name}': invalid remote data: {source}")]
    InvalidRemoteData {
        op: Operation,
        name: String,
        #[source]
        source: MappingError,
    },

    /// The control plane rejected the payload. `message` is the server's text.
    #[error("{op} endpoint '{name}': rejected: {message}")]
    Validation {
        op: Operation,
        name: String,
        message: String,
    },

    #[error("{op} endpoint '{name}' failed: {source}")]
    OperationFailed {
        op: Operation,
        name: String,
        #[source]
        source: ApiError,
    },
}

impl ReconcileError {
    /// Attach context to a client error. Payload rejections keep the server
    /// message; everything else is wrapped as-is.
    pub fn from_api(op: Operation, name: impl Into<String>, err: ApiError) -> Self {
        let name = name.into();
        match err {
            ApiError::Validation(message) => Self::Validation { op, name, message },
            source => Self::OperationFailed { op, name, source },
        }
    }

    pub fn invalid_remote(op: Operation, name: impl Into<String>, source: MappingError) -> Self {
        Self::InvalidRemoteData {
            op,
            name: name.into(),
            source,
        }
    }

    pub fn op(&self) -> Operation {
        match self {
            Self::InvalidRemoteData { op, .. }
            | Self::Validation { op, .. }
            | Self::OperationFailed { op, .. } => *op,
        }
    }

    /// Name of the endpoint the failed operation targeted.
    pub fn name(&self) -> &str {
        match self {
            Self::InvalidRemoteData { name, .. }
            | Self::Validation { name, .. }
            | Self::OperationFailed { name, .. } => name,
        }
    }
}
