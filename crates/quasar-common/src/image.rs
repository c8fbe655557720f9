use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tristate::Tristate;

/// Serving engine a model runs on. Exactly one variant is ever populated.
///
/// Manifests use the externally tagged form, e.g. `{"tgi": {"url": "..."}}`;
/// an object naming two engines fails to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Image {
    Huggingface(HuggingfaceImage),
    Custom(CustomImage),
    Tgi(TgiImage),
    TgiNeuron(TgiNeuronImage),
    TgiTpu(TgiTpuImage),
    Tei(TeiImage),
    Llamacpp(LlamacppImage),
    Vllm(VllmImage),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Huggingface,
    Custom,
    Tgi,
    TgiNeuron,
    TgiTpu,
    Tei,
    Llamacpp,
    Vllm,
}

impl ImageKind {
    /// Order in which variant slots are inspected when more than one could apply.
    pub const PRECEDENCE: [ImageKind; 8] = [
        ImageKind::Huggingface,
        ImageKind::Custom,
        ImageKind::Tgi,
        ImageKind::TgiNeuron,
        ImageKind::TgiTpu,
        ImageKind::Tei,
        ImageKind::Llamacpp,
        ImageKind::Vllm,
    ];

    /// Manifest key, snake_case.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Huggingface => "huggingface",
            Self::Custom => "custom",
            Self::Tgi => "tgi",
            Self::TgiNeuron => "tgi_neuron",
            Self::TgiTpu => "tgi_tpu",
            Self::Tei => "tei",
            Self::Llamacpp => "llamacpp",
            Self::Vllm => "vllm",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Image {
    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Huggingface(_) => ImageKind::Huggingface,
            Self::Custom(_) => ImageKind::Custom,
            Self::Tgi(_) => ImageKind::Tgi,
            Self::TgiNeuron(_) => ImageKind::TgiNeuron,
            Self::TgiTpu(_) => ImageKind::TgiTpu,
            Self::Tei(_) => ImageKind::Tei,
            Self::Llamacpp(_) => ImageKind::Llamacpp,
            Self::Vllm(_) => ImageKind::Vllm,
        }
    }

    /// Container settings shared by every server-backed variant.
    pub fn server(&self) -> Option<&ServerConfig> {
        match self {
            Self::Huggingface(_) => None,
            Self::Custom(i) => Some(&i.server),
            Self::Tgi(i) => Some(&i.server),
            Self::TgiNeuron(i) => Some(&i.server),
            Self::TgiTpu(i) => Some(&i.server),
            Self::Tei(i) => Some(&i.server),
            Self::Llamacpp(i) => Some(&i.server),
            Self::Vllm(i) => Some(&i.server),
        }
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::Huggingface(HuggingfaceImage {})
    }
}

/// Container URL, health route and port.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub url: String,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub health_route: Tristate<String>,

    /// Server picks the port when left unset.
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub port: Tristate<u16>,
}

impl ServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HuggingfaceImage {}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Arbitrary user container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    /// Registry credentials for private images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Container environment. Always serialized, so an emptied map still
    /// replaces the remote one.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Text Generation Inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TgiImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_batch_prefill_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_batch_total_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_input_length: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_total_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub disable_custom_kernels: Tristate<bool>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub quantize: Tristate<String>,
}

/// TGI built for AWS Inferentia/Trainium.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TgiNeuronImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_batch_prefill_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_batch_total_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_input_length: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_total_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub hf_auto_cast_type: Tristate<String>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub hf_num_cores: Tristate<u32>,
}

/// TGI built for Google TPUs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TgiTpuImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_batch_prefill_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_input_length: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_total_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub disable_custom_kernels: Tristate<bool>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub quantize: Tristate<String>,
}

/// Text Embeddings Inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeiImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_batch_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_concurrent_requests: Tristate<u32>,
    /// e.g. "cls" or "mean"
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub pooling: Tristate<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlamacppImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    /// GGUF file inside the repository.
    pub model_path: String,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub ctx_size: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub embeddings: Tristate<bool>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub n_parallel: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub threads_http: Tristate<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VllmImage {
    #[serde(flatten)]
    pub server: ServerConfig,

    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub kv_cache_dtype: Tristate<String>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_num_batched_tokens: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_num_seqs: Tristate<u32>,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub tensor_parallel_size: Tristate<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_precedence_order() {
        let names: Vec<&str> = ImageKind::PRECEDENCE.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["huggingface", "custom", "tgi", "tgi_neuron", "tgi_tpu", "tei", "llamacpp", "vllm"]
        );
    }

    #[test]
    fn test_manifest_single_variant() {
        let image: Image = serde_json::from_value(json!({
            "tgi": { "url": "ghcr.io/huggingface/tgi:latest", "max_total_tokens": 2048 }
        }))
        .unwrap();
        let Image::Tgi(tgi) = &image else {
            panic!("expected tgi, got {:?}", image.kind());
        };
        assert_eq!(tgi.server.url, "ghcr.io/huggingface/tgi:latest");
        assert_eq!(tgi.max_total_tokens, Tristate::Value(2048));
        assert_eq!(tgi.max_input_length, Tristate::Unset);
        assert!(tgi.server.port.is_unset());
    }

    #[test]
    fn test_manifest_two_variants_rejected() {
        let res = serde_json::from_value::<Image>(json!({
            "tgi": { "url": "a" },
            "tei": { "url": "b" }
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_manifest_no_variant_rejected() {
        assert!(serde_json::from_value::<Image>(json!({})).is_err());
    }

    #[test]
    fn test_huggingface_has_no_server() {
        let image: Image = serde_json::from_value(json!({ "huggingface": {} })).unwrap();
        assert_eq!(image.kind(), ImageKind::Huggingface);
        assert!(image.server().is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "bot".to_string(),
            password: "hunter2".to_string(),
        };
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("bot"));
        assert!(!dbg.contains("hunter2"));
    }
}
