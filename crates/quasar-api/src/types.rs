use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::wire::{CreateEndpointRequest, RemoteEndpoint, UpdateEndpointRequest};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The named endpoint does not exist (HTTP 404).
    #[error("endpoint not found")]
    NotFound,

    /// The control plane rejected the payload; message as sent by the server.
    #[error("request rejected: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Injected by the in-memory client.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// The five calls the control plane exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    List,
    Create,
    Get,
    Update,
    Delete,
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Client for the endpoints control plane, scoped to one namespace.
///
/// Each call is a single request; implementations do not retry.
#[async_trait]
pub trait EndpointApi: Send + Sync {
    async fn list(&self) -> Result<Vec<RemoteEndpoint>, ApiError>;

    async fn create(&self, req: &CreateEndpointRequest) -> Result<RemoteEndpoint, ApiError>;

    /// Fails with [`ApiError::NotFound`] when absent.
    async fn get(&self, name: &str) -> Result<RemoteEndpoint, ApiError>;

    async fn update(
        &self,
        name: &str,
        req: &UpdateEndpointRequest,
    ) -> Result<RemoteEndpoint, ApiError>;

    /// Fails with [`ApiError::NotFound`] when absent.
    async fn delete(&self, name: &str) -> Result<(), ApiError>;
}
