use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use quasar_api::{EndpointApi, RemoteEndpoint};
use quasar_common::{Endpoint, Tristate};

use crate::error::{Operation, ReconcileError};
use crate::mapping::{to_create_request, to_desired_state, to_update_request};

/// Drives one convergence step per call against the control plane.
///
/// Holds nothing but the client. Every operation returns the resulting
/// canonical state for the caller to persist; no retries are attempted.
#[derive(Debug, Clone)]
pub struct Reconciler<A> {
    api: A,
}

fn map_response(
    op: Operation,
    name: &str,
    remote: &RemoteEndpoint,
) -> Result<Endpoint, ReconcileError> {
    to_desired_state(remote).map_err(|e| ReconcileError::invalid_remote(op, name, e))
}

// `type` is only sent when it actually changes.
fn type_change(current: &str, desired: &Endpoint) -> Tristate<String> {
    if current == desired.endpoint_type {
        Tristate::Unset
    } else {
        Tristate::Value(desired.endpoint_type.clone())
    }
}

impl<A: EndpointApi> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Create the endpoint, or update it if one with the same name is
    /// already listed. The update carries `type` only when the listed one
    /// differs.
    pub async fn apply(&self, desired: &Endpoint) -> Result<Endpoint, ReconcileError> {
        let span = info_span!("apply", op_id = %Uuid::new_v4(), name = %desired.name);
        async {
            let existing = self
                .api
                .list()
                .await
                .map_err(|e| ReconcileError::from_api(Operation::List, &desired.name, e))?;

            if let Some(current) = existing.iter().find(|ep| ep.name == desired.name) {
                info!("endpoint exists, updating");
                self.update_inner(desired, type_change(&current.endpoint_type, desired))
                    .await
            } else {
                info!("endpoint not found, creating");
                let req = to_create_request(desired);
                let created = self
                    .api
                    .create(&req)
                    .await
                    .map_err(|e| ReconcileError::from_api(Operation::Create, &desired.name, e))?;
                map_response(Operation::Create, &desired.name, &created)
            }
        }
        .instrument(span)
        .await
    }

    /// Current remote state, or `None` once the endpoint is gone.
    pub async fn refresh(&self, name: &str) -> Result<Option<Endpoint>, ReconcileError> {
        let span = info_span!("refresh", op_id = %Uuid::new_v4(), name = %name);
        async {
            match self.api.get(name).await {
                Ok(remote) => map_response(Operation::Read, name, &remote).map(Some),
                Err(e) if e.is_not_found() => {
                    info!("endpoint absent");
                    Ok(None)
                }
                Err(e) => Err(ReconcileError::OperationFailed {
                    op: Operation::Read,
                    name: name.to_string(),
                    source: e,
                }),
            }
        }
        .instrument(span)
        .await
    }

    /// Update without an existence check. Sends the desired `type`.
    pub async fn update(&self, desired: &Endpoint) -> Result<Endpoint, ReconcileError> {
        self.update_with(desired, Tristate::Value(desired.endpoint_type.clone()))
            .await
    }

    /// Update with an explicit `type` change; `Unset` leaves the remote type
    /// untouched.
    pub async fn update_with(
        &self,
        desired: &Endpoint,
        endpoint_type: Tristate<String>,
    ) -> Result<Endpoint, ReconcileError> {
        let span = info_span!("update", op_id = %Uuid::new_v4(), name = %desired.name);
        self.update_inner(desired, endpoint_type)
            .instrument(span)
            .await
    }

    async fn update_inner(
        &self,
        desired: &Endpoint,
        endpoint_type: Tristate<String>,
    ) -> Result<Endpoint, ReconcileError> {
        let req = to_update_request(desired, endpoint_type);
        debug!(type_change = req.endpoint_type.is_some(), "sending update");
        let updated = self
            .api
            .update(&desired.name, &req)
            .await
            .map_err(|e| ReconcileError::from_api(Operation::Update, &desired.name, e))?;
        map_response(Operation::Update, &desired.name, &updated)
    }

    /// Delete the endpoint. Already gone counts as success.
    pub async fn destroy(&self, name: &str) -> Result<(), ReconcileError> {
        let span = info_span!("destroy", op_id = %Uuid::new_v4(), name = %name);
        async {
            match self.api.delete(name).await {
                Ok(()) => {
                    info!("endpoint deleted");
                    Ok(())
                }
                Err(e) if e.is_not_found() => {
                    info!("endpoint already absent");
                    Ok(())
                }
                Err(e) => Err(ReconcileError::OperationFailed {
                    op: Operation::Delete,
                    name: name.to_string(),
                    source: e,
                }),
            }
        }
        .instrument(span)
        .await
    }

    /// Every endpoint in the namespace. Fails on the first item that does not
    /// map, naming it.
    pub async fn list(&self) -> Result<Vec<Endpoint>, ReconcileError> {
        let span = info_span!("list", op_id = %Uuid::new_v4());
        async {
            let items = self
                .api
                .list()
                .await
                .map_err(|e| ReconcileError::from_api(Operation::List, "*", e))?;
            debug!(count = items.len(), "listed endpoints");
            items
                .iter()
                .map(|remote| map_response(Operation::List, &remote.name, remote))
                .collect()
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quasar_api::{
        ApiCall, ApiError, MemoryEndpointApi, RecordedCall, RemoteImage, ServerDefaults,
    };
    use quasar_common::{Cloud, Compute, Image, Model, Scaling, ServerConfig, TgiImage};
    use std::collections::BTreeMap;

    fn svc_a() -> Endpoint {
        Endpoint {
            name: "svc-a".to_string(),
            account_id: Tristate::Unset,
            compute: Compute {
                accelerator: "gpu".to_string(),
                instance_size: "x1".to_string(),
                instance_type: "nvidia-a10g".to_string(),
                scaling: Scaling {
                    min_replica: 1,
                    max_replica: 1,
                    scale_to_zero_timeout: Tristate::Unset,
                    measure: None,
                },
            },
            model: Model {
                framework: "pytorch".to_string(),
                repository: "openai-community/gpt2".to_string(),
                revision: Tristate::Unset,
                task: Tristate::Unset,
                env: BTreeMap::new(),
                image: Image::Tgi(TgiImage {
                    server: ServerConfig::new("http://x"),
                    max_total_tokens: Tristate::Unset,
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

    fn tgi(ep: &Endpoint) -> &TgiImage {
        match &ep.model.image {
            Image::Tgi(t) => t,
            other => panic!("expected tgi, got {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_apply_creates_when_absent() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());

        let ep = rec.apply(&svc_a()).await.unwrap();

        let calls = api.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], RecordedCall::List);
        let RecordedCall::Create(req) = &calls[1] else {
            panic!("expected create, got {:?}", calls[1]);
        };
        let payload = serde_json::to_value(req).unwrap();
        assert_eq!(
            payload["model"]["image"],
            serde_json::json!({ "tgi": { "url": "http://x" } })
        );

        assert_eq!(tgi(&ep).max_total_tokens, Tristate::Unset);
        assert_eq!(ep.status.as_ref().unwrap().state, "pending");
    }

    #[tokio::test]
    async fn test_apply_updates_when_listed() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();

        let mut desired = svc_a();
        desired.compute.scaling.max_replica = 3;
        let ep = rec.apply(&desired).await.unwrap();

        assert_eq!(
            api.call_kinds().await,
            vec![ApiCall::List, ApiCall::Create, ApiCall::List, ApiCall::Update]
        );
        assert_eq!(ep.compute.scaling.max_replica, 3);
        assert_eq!(ep.status.unwrap().state, "updating");
    }

    #[tokio::test]
    async fn test_reapply_leaves_type_out() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();
        rec.apply(&svc_a()).await.unwrap();

        let calls = api.calls().await;
        let Some(RecordedCall::Update(name, req)) = calls.last() else {
            panic!("expected update, got {:?}", calls.last());
        };
        assert_eq!(name, "svc-a");
        assert_eq!(req.endpoint_type, None);
        assert!(req.compute.is_some());
        assert!(req.model.is_some());
    }

    #[tokio::test]
    async fn test_apply_sends_changed_type() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();

        let mut desired = svc_a();
        desired.endpoint_type = "public".to_string();
        let ep = rec.apply(&desired).await.unwrap();
        assert_eq!(ep.endpoint_type, "public");

        let calls = api.calls().await;
        let Some(RecordedCall::Update(_, req)) = calls.last() else {
            panic!("expected update, got {:?}", calls.last());
        };
        assert_eq!(req.endpoint_type.as_deref(), Some("public"));
    }

    #[tokio::test]
    async fn test_apply_captures_server_defaults() {
        let api = MemoryEndpointApi::with_defaults(ServerDefaults {
            port: Some(80),
            scale_to_zero_timeout: Some(15),
            revision: Some("607a30d".to_string()),
        });
        let rec = Reconciler::new(api);

        let ep = rec.apply(&svc_a()).await.unwrap();
        assert_eq!(tgi(&ep).server.port, Tristate::Value(80));
        assert_eq!(ep.compute.scaling.scale_to_zero_timeout, Tristate::Value(15));
        assert_eq!(ep.model.revision, Tristate::Value("607a30d".to_string()));
    }

    #[tokio::test]
    async fn test_update_with_unset_type_leaves_it() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();

        let mut desired = svc_a();
        desired.endpoint_type = "public".to_string();
        let ep = rec.update_with(&desired, Tristate::Unset).await.unwrap();
        assert_eq!(ep.endpoint_type, "protected");

        let ep = rec.update(&desired).await.unwrap();
        assert_eq!(ep.endpoint_type, "public");
    }

    #[tokio::test]
    async fn test_update_missing_is_error() {
        let rec = Reconciler::new(MemoryEndpointApi::new());
        let err = rec.update(&svc_a()).await.unwrap_err();
        assert_eq!(err.op(), Operation::Update);
        assert_eq!(err.name(), "svc-a");
        assert!(matches!(
            err,
            ReconcileError::OperationFailed {
                source: ApiError::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_create_rejection_keeps_message() {
        let api = MemoryEndpointApi::new();
        api.fail_next(
            ApiCall::Create,
            ApiError::Validation("instance type not available".to_string()),
        )
        .await;
        let rec = Reconciler::new(api);

        let err = rec.apply(&svc_a()).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Validation { op: Operation::Create, ref name, ref message }
                if name == "svc-a" && message == "instance type not available"
        ));
    }

    #[tokio::test]
    async fn test_apply_list_failure() {
        let api = MemoryEndpointApi::new();
        api.fail_next(ApiCall::List, ApiError::Unavailable("down".to_string()))
            .await;
        let rec = Reconciler::new(api.clone());

        let err = rec.apply(&svc_a()).await.unwrap_err();
        assert_eq!(err.op(), Operation::List);
        assert_eq!(api.call_kinds().await, vec![ApiCall::List]);
    }

    #[tokio::test]
    async fn test_refresh_absent_is_none() {
        let rec = Reconciler::new(MemoryEndpointApi::new());
        assert_eq!(rec.refresh("svc-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_other_error_surfaces() {
        let api = MemoryEndpointApi::new();
        api.fail_next(ApiCall::Get, ApiError::Unavailable("down".to_string()))
            .await;
        let rec = Reconciler::new(api);

        let err = rec.refresh("svc-a").await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::OperationFailed {
                op: Operation::Read,
                source: ApiError::Unavailable(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_refresh_invalid_remote() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();

        let mut broken = api.snapshot("svc-a").await.unwrap();
        broken.model.image = RemoteImage::default();
        api.insert(broken).await;

        let err = rec.refresh("svc-a").await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::InvalidRemoteData { op: Operation::Read, .. }
        ));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();

        rec.destroy("svc-a").await.unwrap();
        assert!(api.snapshot("svc-a").await.is_none());
        rec.destroy("svc-a").await.unwrap();
    }

    #[tokio::test]
    async fn test_destroy_other_error_surfaces() {
        let api = MemoryEndpointApi::new();
        api.fail_next(
            ApiCall::Delete,
            ApiError::Status {
                status: 500,
                body: "internal".to_string(),
            },
        )
        .await;
        let rec = Reconciler::new(api);

        let err = rec.destroy("svc-a").await.unwrap_err();
        assert_eq!(err.op(), Operation::Delete);
        assert_eq!(err.name(), "svc-a");
    }

    #[tokio::test]
    async fn test_list_maps_items() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();
        let mut other = svc_a();
        other.name = "svc-b".to_string();
        rec.apply(&other).await.unwrap();

        let names: Vec<_> = rec.list().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["svc-a", "svc-b"]);
    }

    #[tokio::test]
    async fn test_list_names_broken_item() {
        let api = MemoryEndpointApi::new();
        let rec = Reconciler::new(api.clone());
        rec.apply(&svc_a()).await.unwrap();
        let mut broken = api.snapshot("svc-a").await.unwrap();
        broken.name = "svc-z".to_string();
        broken.model.image.vllm = Some(Default::default());
        api.insert(broken).await;

        let err = rec.list().await.unwrap_err();
        assert_eq!(err.name(), "svc-z");
        assert!(matches!(err, ReconcileError::InvalidRemoteData { .. }));
    }
}
