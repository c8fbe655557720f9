use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::image::Image;
use crate::tristate::Tristate;

/// A named, cloud-hosted inference deployment. The unit of reconciliation.
///
/// The same shape carries both desired state (from a manifest, `status` empty)
/// and observed state (mapped back from the control plane, `status` filled).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    /// Unique within an account scope. Immutable after creation; used as the
    /// identifier for reads, updates and deletes.
    pub name: String,

    /// Absent means the caller's default account.
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub account_id: Tristate<String>,

    pub compute: Compute,

    pub model: Model,

    pub cloud: Cloud,

    /// Visibility class, e.g. "protected", "public", "private".
    #[serde(rename = "type")]
    pub endpoint_type: String,

    /// Server-owned. Never sent outbound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EndpointStatus>,
}

impl Endpoint {
    /// Copy of this endpoint with `status` removed, i.e. only the parts a
    /// caller can declare.
    pub fn without_status(&self) -> Self {
        Self {
            status: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Compute {
    /// "cpu" or "gpu".
    pub accelerator: String,
    /// e.g. "x1", "x4".
    pub instance_size: String,
    /// e.g. "nvidia-a10g", "intel-icl".
    pub instance_type: String,
    pub scaling: Scaling,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scaling {
    pub min_replica: u32,
    pub max_replica: u32,

    /// Minutes of inactivity before scaling to zero. Computed by the server
    /// when unset.
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub scale_to_zero_timeout: Tristate<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<Measure>,
}

/// Autoscaling signal thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Measure {
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub hardware_usage: Tristate<f64>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub pending_requests: Tristate<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// e.g. "pytorch", "custom".
    pub framework: String,

    /// Hub repository, e.g. "meta-llama/Llama-3.1-8B-Instruct".
    pub repository: String,

    /// Commit sha. The server pins the current head when unset.
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub revision: Tristate<String>,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub task: Tristate<String>,

    /// Environment passed to the serving container. Never absent: an empty
    /// map stands for "no variables".
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    pub image: Image,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cloud {
    /// e.g. "us-east-1".
    pub region: String,
    /// e.g. "aws", "azure", "gcp".
    pub vendor: String,
}

/// Lifecycle information reported by the control plane. Copied verbatim;
/// `state` is not interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointStatus {
    pub state: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub ready_replica: u32,

    #[serde(default)]
    pub target_replica: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<PrivateService>,

    /// RFC 3339 timestamp as sent by the server.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: Actor,

    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub updated_by: Actor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

/// PrivateLink service exposed for endpoints of type "private".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateService {
    pub service_name: String,
}
