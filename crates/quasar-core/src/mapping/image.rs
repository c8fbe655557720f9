//! Variant-dispatched conversion between [`Image`] and the remote
//! one-slot-per-engine [`RemoteImage`]. Both directions share one field table
//! per engine.

use quasar_api::{
    RemoteCredentials, RemoteCustom, RemoteHuggingface, RemoteImage, RemoteLlamacpp, RemoteTei,
    RemoteTgi, RemoteTgiNeuron, RemoteTgiTpu, RemoteVllm,
};
use quasar_common::{
    Credentials, CustomImage, HuggingfaceImage, Image, LlamacppImage, ServerConfig, TeiImage,
    TgiImage, TgiNeuronImage, TgiTpuImage, VllmImage,
};

use crate::error::MappingError;

/// Two-way conversion for a single engine payload.
trait EngineMapping: Sized {
    type Remote;

    fn to_remote(&self) -> Self::Remote;

    fn from_remote(remote: &Self::Remote) -> Self;
}

/// Implements [`EngineMapping`] for a server-backed engine from its field list.
///
/// `url`, `health_route` and `port` are handled for every engine. Fields under
/// `required` are copied as-is; fields under `optional` move between
/// `Tristate` and `Option`, so an unset field is never sent.
macro_rules! engine_mapping {
    (
        $local:ty => $remote:ident {
            required: [$($req:ident),* $(,)?],
            optional: [$($opt:ident),* $(,)?] $(,)?
        }
    ) => {
        impl EngineMapping for $local {
            type Remote = $remote;

            fn to_remote(&self) -> $remote {
                $remote {
                    url: self.server.url.clone(),
                    health_route: self.server.health_route.cloned_option(),
                    port: self.server.port.cloned_option(),
                    $($req: self.$req.clone(),)*
                    $($opt: self.$opt.cloned_option(),)*
                }
            }

            fn from_remote(remote: &$remote) -> Self {
                Self {
                    server: server_from_remote(&remote.url, &remote.health_route, remote.port),
                    $($req: remote.$req.clone(),)*
                    $($opt: remote.$opt.clone().into(),)*
                }
            }
        }
    };
}

fn server_from_remote(url: &str, health_route: &Option<String>, port: Option<u16>) -> ServerConfig {
    ServerConfig {
        url: url.to_string(),
        health_route: health_route.clone().into(),
        port: port.into(),
    }
}

engine_mapping!(TgiImage => RemoteTgi {
    required: [],
    optional: [
        max_batch_prefill_tokens,
        max_batch_total_tokens,
        max_input_length,
        max_total_tokens,
        disable_custom_kernels,
        quantize,
    ],
});

engine_mapping!(TgiNeuronImage => RemoteTgiNeuron {
    required: [],
    optional: [
        max_batch_prefill_tokens,
        max_batch_total_tokens,
        max_input_length,
        max_total_tokens,
        hf_auto_cast_type,
        hf_num_cores,
    ],
});

engine_mapping!(TgiTpuImage => RemoteTgiTpu {
    required: [],
    optional: [
        max_batch_prefill_tokens,
        max_input_length,
        max_total_tokens,
        disable_custom_kernels,
        quantize,
    ],
});

engine_mapping!(TeiImage => RemoteTei {
    required: [],
    optional: [max_batch_tokens, max_concurrent_requests, pooling],
});

engine_mapping!(LlamacppImage => RemoteLlamacpp {
    required: [model_path],
    optional: [ctx_size, embeddings, n_parallel, threads_http],
});

engine_mapping!(VllmImage => RemoteVllm {
    required: [],
    optional: [kv_cache_dtype, max_num_batched_tokens, max_num_seqs, tensor_parallel_size],
});

// Credentials and env don't fit the scalar table.
impl EngineMapping for CustomImage {
    type Remote = RemoteCustom;

    fn to_remote(&self) -> RemoteCustom {
        RemoteCustom {
            url: self.server.url.clone(),
            health_route: self.server.health_route.cloned_option(),
            port: self.server.port.cloned_option(),
            credentials: self.credentials.as_ref().map(|c| RemoteCredentials {
                username: c.username.clone(),
                password: c.password.clone(),
            }),
            env: Some(self.env.clone()),
        }
    }

    fn from_remote(remote: &RemoteCustom) -> Self {
        Self {
            server: server_from_remote(&remote.url, &remote.health_route, remote.port),
            credentials: remote.credentials.as_ref().map(|c| Credentials {
                username: c.username.clone(),
                password: c.password.clone(),
            }),
            env: remote.env.clone().unwrap_or_default(),
        }
    }
}

/// Fill exactly the slot matching the populated variant; every other slot
/// stays `None` and is left out of the payload.
pub fn image_to_remote(image: &Image) -> RemoteImage {
    let mut out = RemoteImage::default();
    match image {
        Image::Huggingface(_) => out.huggingface = Some(RemoteHuggingface {}),
        Image::Custom(i) => out.custom = Some(i.to_remote()),
        Image::Tgi(i) => out.tgi = Some(i.to_remote()),
        Image::TgiNeuron(i) => out.tgi_neuron = Some(i.to_remote()),
        Image::TgiTpu(i) => out.tgi_tpu = Some(i.to_remote()),
        Image::Tei(i) => out.tei = Some(i.to_remote()),
        Image::Llamacpp(i) => out.llamacpp = Some(i.to_remote()),
        Image::Vllm(i) => out.vllm = Some(i.to_remote()),
    }
    out
}

/// Build the single populated variant. A remote image with no slot or with
/// several slots filled is a broken server contract and is reported, not
/// coerced.
pub fn image_from_remote(remote: &RemoteImage) -> Result<Image, MappingError> {
    // Precedence order.
    let mut candidates = [
        remote
            .huggingface
            .as_ref()
            .map(|_| Image::Huggingface(HuggingfaceImage {})),
        remote.custom.as_ref().map(|r| Image::Custom(CustomImage::from_remote(r))),
        remote.tgi.as_ref().map(|r| Image::Tgi(TgiImage::from_remote(r))),
        remote
            .tgi_neuron
            .as_ref()
            .map(|r| Image::TgiNeuron(TgiNeuronImage::from_remote(r))),
        remote.tgi_tpu.as_ref().map(|r| Image::TgiTpu(TgiTpuImage::from_remote(r))),
        remote.tei.as_ref().map(|r| Image::Tei(TeiImage::from_remote(r))),
        remote
            .llamacpp
            .as_ref()
            .map(|r| Image::Llamacpp(LlamacppImage::from_remote(r))),
        remote.vllm.as_ref().map(|r| Image::Vllm(VllmImage::from_remote(r))),
    ]
    .into_iter()
    .flatten();

    let image = candidates.next().ok_or(MappingError::NoImage)?;
    if candidates.next().is_some() {
        return Err(MappingError::MultipleImages(remote.populated()));
    }
    Ok(image)
}
