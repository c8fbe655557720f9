//! JSON shapes exchanged with the endpoints control plane.
//!
//! These mirror the remote API exactly: camelCase keys, plain `Option`s for
//! anything that may be missing, and one nullable slot per image engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use quasar_common::ImageKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEndpoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub compute: RemoteCompute,
    pub model: RemoteModel,
    pub provider: RemoteProvider,
    #[serde(rename = "type")]
    pub endpoint_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RemoteStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCompute {
    pub accelerator: String,
    pub instance_size: String,
    pub instance_type: String,
    pub scaling: RemoteScaling,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteScaling {
    pub min_replica: u32,
    pub max_replica: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_to_zero_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<RemoteMeasure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMeasure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_requests: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteModel {
    pub framework: String,
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    pub image: RemoteImage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteProvider {
    pub region: String,
    pub vendor: String,
}

/// One slot per engine. The server is expected to fill exactly one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface: Option<RemoteHuggingface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<RemoteCustom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgi: Option<RemoteTgi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgi_neuron: Option<RemoteTgiNeuron>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgi_tpu: Option<RemoteTgiTpu>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tei: Option<RemoteTei>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llamacpp: Option<RemoteLlamacpp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vllm: Option<RemoteVllm>,
}

impl RemoteImage {
    /// Slots that carry a value, in precedence order.
    pub fn populated(&self) -> Vec<ImageKind> {
        ImageKind::PRECEDENCE
            .into_iter()
            .filter(|kind| self.is_populated(*kind))
            .collect()
    }

    pub fn is_populated(&self, kind: ImageKind) -> bool {
        match kind {
            ImageKind::Huggingface => self.huggingface.is_some(),
            ImageKind::Custom => self.custom.is_some(),
            ImageKind::Tgi => self.tgi.is_some(),
            ImageKind::TgiNeuron => self.tgi_neuron.is_some(),
            ImageKind::TgiTpu => self.tgi_tpu.is_some(),
            ImageKind::Tei => self.tei.is_some(),
            ImageKind::Llamacpp => self.llamacpp.is_some(),
            ImageKind::Vllm => self.vllm.is_some(),
        }
    }

    /// Port of whichever server-backed slot is filled first.
    pub fn port_mut(&mut self) -> Option<&mut Option<u16>> {
        if let Some(i) = self.custom.as_mut() {
            return Some(&mut i.port);
        }
        if let Some(i) = self.tgi.as_mut() {
            return Some(&mut i.port);
        }
        if let Some(i) = self.tgi_neuron.as_mut() {
            return Some(&mut i.port);
        }
        if let Some(i) = self.tgi_tpu.as_mut() {
            return Some(&mut i.port);
        }
        if let Some(i) = self.tei.as_mut() {
            return Some(&mut i.port);
        }
        if let Some(i) = self.llamacpp.as_mut() {
            return Some(&mut i.port);
        }
        self.vllm.as_mut().map(|i| &mut i.port)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteHuggingface {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCustom {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<RemoteCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTgi {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_prefill_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_custom_kernels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantize: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTgiNeuron {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_prefill_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_auto_cast_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_num_cores: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTgiTpu {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_prefill_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_custom_kernels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantize: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTei {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooling: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLlamacpp {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub model_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctx_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_parallel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads_http: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVllm {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv_cache_dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_batched_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_seqs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tensor_parallel_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ready_replica: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_replica: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<RemotePrivate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: RemoteUser,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_by: RemoteUser,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemotePrivate {
    pub service_name: String,
}

// The control plane sends `null` for status fields it hasn't filled in yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST {base}/{namespace}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEndpointRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub compute: RemoteCompute,
    pub model: RemoteModel,
    pub provider: RemoteProvider,
    #[serde(rename = "type")]
    pub endpoint_type: String,
}

/// Body of `PUT {base}/{namespace}/{name}`. A present sub-object replaces the
/// remote one wholesale; an absent one is left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEndpointRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<RemoteCompute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<RemoteModel>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
}

/// Body of `GET {base}/{namespace}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEndpointsResponse {
    #[serde(default)]
    pub items: Vec<RemoteEndpoint>,
}
