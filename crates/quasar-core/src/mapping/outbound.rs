//! Write path: canonical state to control plane requests. `Unset` and
//! `Unknown` fields are left out; nothing is defaulted here.

use quasar_api::{
    CreateEndpointRequest, RemoteCompute, RemoteMeasure, RemoteModel, RemoteProvider,
    RemoteScaling, UpdateEndpointRequest,
};
use quasar_common::{Compute, Endpoint, Model, Tristate};

use crate::mapping::image::image_to_remote;

pub fn to_create_request(desired: &Endpoint) -> CreateEndpointRequest {
    CreateEndpointRequest {
        name: desired.name.clone(),
        account_id: desired.account_id.cloned_option(),
        compute: compute_to_remote(&desired.compute),
        model: model_to_remote(&desired.model),
        provider: RemoteProvider {
            region: desired.cloud.region.clone(),
            vendor: desired.cloud.vendor.clone(),
        },
        endpoint_type: desired.endpoint_type.clone(),
    }
}

/// Full replace of `compute` and `model`. `endpoint_type` is sent only when
/// it carries a value, so passing `Unset` leaves the remote type alone.
pub fn to_update_request(
    desired: &Endpoint,
    endpoint_type: Tristate<String>,
) -> UpdateEndpointRequest {
    UpdateEndpointRequest {
        compute: Some(compute_to_remote(&desired.compute)),
        model: Some(model_to_remote(&desired.model)),
        endpoint_type: endpoint_type.into_option(),
    }
}

fn compute_to_remote(compute: &Compute) -> RemoteCompute {
    let scaling = &compute.scaling;
    RemoteCompute {
        accelerator: compute.accelerator.clone(),
        instance_size: compute.instance_size.clone(),
        instance_type: compute.instance_type.clone(),
        scaling: RemoteScaling {
            min_replica: scaling.min_replica,
            max_replica: scaling.max_replica,
            scale_to_zero_timeout: scaling.scale_to_zero_timeout.cloned_option(),
            measure: scaling.measure.as_ref().map(|m| RemoteMeasure {
                hardware_usage: m.hardware_usage.cloned_option(),
                pending_requests: m.pending_requests.cloned_option(),
            }),
        },
    }
}

// env goes out even when empty: the update replaces the model wholesale and
// removed variables must be cleared remotely.
fn model_to_remote(model: &Model) -> RemoteModel {
    RemoteModel {
        framework: model.framework.clone(),
        repository: model.repository.clone(),
        revision: model.revision.cloned_option(),
        task: model.task.cloned_option(),
        env: Some(model.env.clone()),
        image: image_to_remote(&model.image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::to_desired_state;
    use quasar_api::RemoteEndpoint;
    use quasar_common::{
        Cloud, Image, Measure, Scaling, ServerConfig, TeiImage, TgiImage,
    };
    use serde_json::json;
    use std::collections::BTreeMap;

    fn desired() -> Endpoint {
        Endpoint {
            name: "svc-a".to_string(),
            account_id: Tristate::Unset,
            compute: Compute {
                accelerator: "gpu".to_string(),
                instance_size: "x1".to_string(),
                instance_type: "nvidia-a10g".to_string(),
                scaling: Scaling {
                    min_replica: 0,
                    max_replica: 2,
                    scale_to_zero_timeout: Tristate::Unknown,
                    measure: None,
                },
            },
            model: Model {
                framework: "pytorch".to_string(),
                repository: "openai-community/gpt2".to_string(),
                revision: Tristate::Unset,
                task: Tristate::Value("text-generation".to_string()),
                env: BTreeMap::new(),
                image: Image::Tgi(TgiImage {
                    server: ServerConfig::new("ghcr.io/huggingface/tgi:3.0"),
                    max_total_tokens: Tristate::Value(2048),
                    ..Default::default()
                }),
            },
            cloud: Cloud {
                region: "us-east-1".to_string(),
                vendor: "aws".to_string(),
            },
            endpoint_type: "protected".to_string(),
            status: None,
        }
    }

    #[test]
    fn test_create_payload() {
        let req = to_create_request(&desired());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "name": "svc-a",
                "type": "protected",
                "compute": {
                    "accelerator": "gpu",
                    "instanceSize": "x1",
                    "instanceType": "nvidia-a10g",
                    "scaling": { "minReplica": 0, "maxReplica": 2 }
                },
                "model": {
                    "framework": "pytorch",
                    "repository": "openai-community/gpt2",
                    "task": "text-generation",
                    "env": {},
                    "image": {
                        "tgi": { "url": "ghcr.io/huggingface/tgi:3.0", "maxTotalTokens": 2048 }
                    }
                },
                "provider": { "region": "us-east-1", "vendor": "aws" }
            })
        );
    }

    #[test]
    fn test_values_emitted() {
        let mut ep = desired();
        ep.account_id = Tristate::Value("acct-1".to_string());
        ep.compute.scaling.scale_to_zero_timeout = Tristate::Value(30);
        ep.compute.scaling.measure = Some(Measure {
            hardware_usage: Tristate::Value(75.0),
            pending_requests: Tristate::Unknown,
        });
        ep.model.env.insert("HF_HUB_OFFLINE".to_string(), "1".to_string());

        let req = to_create_request(&ep);
        assert_eq!(req.account_id.as_deref(), Some("acct-1"));
        assert_eq!(req.compute.scaling.scale_to_zero_timeout, Some(30));
        let measure = req.compute.scaling.measure.unwrap();
        assert_eq!(measure.hardware_usage, Some(75.0));
        assert_eq!(measure.pending_requests, None);
        assert_eq!(
            req.model.env.unwrap().get("HF_HUB_OFFLINE").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_update_with_unset_type_omits_it() {
        let req = to_update_request(&desired(), Tristate::Unset);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("type").is_none());
        assert!(json.get("name").is_none());
        assert!(json.get("provider").is_none());
        assert!(json.get("compute").is_some());
        assert!(json.get("model").is_some());

        let req = to_update_request(&desired(), Tristate::Unknown);
        assert_eq!(req.endpoint_type, None);
    }

    #[test]
    fn test_update_with_value_type() {
        let req = to_update_request(&desired(), Tristate::Value("public".to_string()));
        assert_eq!(req.endpoint_type.as_deref(), Some("public"));
    }

    #[test]
    fn test_only_variant_slot_emitted() {
        let mut ep = desired();
        ep.model.image = Image::Tei(TeiImage {
            server: ServerConfig::new("ghcr.io/huggingface/tei:1.5"),
            pooling: Tristate::Value("mean".to_string()),
            ..Default::default()
        });
        let image = serde_json::to_value(to_create_request(&ep).model.image).unwrap();
        assert_eq!(
            image,
            json!({ "tei": { "url": "ghcr.io/huggingface/tei:1.5", "pooling": "mean" } })
        );
    }

    #[test]
    fn test_unset_scale_to_zero_timeout_omitted() {
        let mut ep = desired();
        ep.compute.scaling.scale_to_zero_timeout = Tristate::Unset;
        let json = serde_json::to_value(to_create_request(&ep)).unwrap();
        assert!(json["compute"]["scaling"].get("scaleToZeroTimeout").is_none());

        ep.compute.scaling.scale_to_zero_timeout = Tristate::Value(0);
        let json = serde_json::to_value(to_create_request(&ep)).unwrap();
        assert_eq!(json["compute"]["scaling"]["scaleToZeroTimeout"], 0);
    }

    fn echo(req: CreateEndpointRequest) -> RemoteEndpoint {
        RemoteEndpoint {
            name: req.name,
            account_id: req.account_id,
            compute: req.compute,
            model: req.model,
            provider: req.provider,
            endpoint_type: req.endpoint_type,
            status: None,
        }
    }

    #[test]
    fn test_endpoint_round_trip() {
        let mut ep = desired();
        ep.account_id = Tristate::Value("acct-1".to_string());
        ep.compute.scaling.scale_to_zero_timeout = Tristate::Value(30);
        ep.model.env.insert("LOG_LEVEL".to_string(), "debug".to_string());
        let back = to_desired_state(&echo(to_create_request(&ep))).unwrap();
        assert_eq!(back, ep);

        // Unset stays unset; Unknown comes back as Unset since nothing was sent.
        let mut ep = desired();
        ep.compute.scaling.scale_to_zero_timeout = Tristate::Unset;
        let back = to_desired_state(&echo(to_create_request(&ep))).unwrap();
        assert_eq!(back, ep);

        let back = to_desired_state(&echo(to_create_request(&desired()))).unwrap();
        assert_eq!(back.compute.scaling.scale_to_zero_timeout, Tristate::Unset);
    }
}
