use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::types::{ApiCall, ApiError, EndpointApi};
use crate::wire::{
    CreateEndpointRequest, RemoteEndpoint, RemoteStatus, RemoteUser, UpdateEndpointRequest,
};

/// A call as received by [`MemoryEndpointApi`], payload included.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    List,
    Create(CreateEndpointRequest),
    Get(String),
    Update(String, UpdateEndpointRequest),
    Delete(String),
}

impl RecordedCall {
    pub fn kind(&self) -> ApiCall {
        match self {
            Self::List => ApiCall::List,
            Self::Create(_) => ApiCall::Create,
            Self::Get(_) => ApiCall::Get,
            Self::Update(..) => ApiCall::Update,
            Self::Delete(_) => ApiCall::Delete,
        }
    }
}

/// Values the fake control plane fills in when a request leaves them out,
/// the way the real service computes defaults. All `None` means "echo the
/// request verbatim".
#[derive(Debug, Clone, Default)]
pub struct ServerDefaults {
    pub port: Option<u16>,
    pub scale_to_zero_timeout: Option<u32>,
    pub revision: Option<String>,
}

/// In-process control plane. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryEndpointApi {
    inner: Arc<RwLock<Inner>>,
    defaults: ServerDefaults,
}

#[derive(Debug, Default)]
struct Inner {
    endpoints: BTreeMap<String, RemoteEndpoint>,
    calls: Vec<RecordedCall>,
    faults: VecDeque<(ApiCall, ApiError)>,
}

const ACTOR: &str = "quasar";

impl MemoryEndpointApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: ServerDefaults) -> Self {
        Self {
            inner: Arc::default(),
            defaults,
        }
    }

    /// Store a remote object as-is, bypassing create. Useful for seeding
    /// pre-existing or malformed state.
    pub async fn insert(&self, endpoint: RemoteEndpoint) {
        let mut inner = self.inner.write().await;
        inner.endpoints.insert(endpoint.name.clone(), endpoint);
    }

    pub async fn snapshot(&self, name: &str) -> Option<RemoteEndpoint> {
        self.inner.read().await.endpoints.get(name).cloned()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.inner.read().await.calls.clone()
    }

    pub async fn call_kinds(&self) -> Vec<ApiCall> {
        self.inner
            .read()
            .await
            .calls
            .iter()
            .map(RecordedCall::kind)
            .collect()
    }

    /// Make the next `call` fail with `err`. Faults queue up in order.
    pub async fn fail_next(&self, call: ApiCall, err: ApiError) {
        self.inner.write().await.faults.push_back((call, err));
    }

    fn take_fault(inner: &mut Inner, call: ApiCall) -> Result<(), ApiError> {
        if let Some(pos) = inner.faults.iter().position(|(c, _)| *c == call) {
            if let Some((_, err)) = inner.faults.remove(pos) {
                return Err(err);
            }
        }
        Ok(())
    }

    fn fill_defaults(&self, ep: &mut RemoteEndpoint) {
        let d = &self.defaults;
        if ep.compute.scaling.scale_to_zero_timeout.is_none() {
            ep.compute.scaling.scale_to_zero_timeout = d.scale_to_zero_timeout;
        }
        if ep.model.revision.is_none() {
            ep.model.revision = d.revision.clone();
        }
        if let Some(port) = ep.model.image.port_mut() {
            if port.is_none() {
                *port = d.port;
            }
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn pending_status(target_replica: u32) -> RemoteStatus {
    let now = now_rfc3339();
    let actor = RemoteUser {
        id: ACTOR.to_string(),
        name: ACTOR.to_string(),
    };
    RemoteStatus {
        state: "pending".to_string(),
        message: "Endpoint is pending".to_string(),
        ready_replica: 0,
        target_replica,
        created_at: now.clone(),
        created_by: actor.clone(),
        updated_at: now,
        updated_by: actor,
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl EndpointApi for MemoryEndpointApi {
    async fn list(&self) -> Result<Vec<RemoteEndpoint>, ApiError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(RecordedCall::List);
        Self::take_fault(&mut inner, ApiCall::List)?;
        Ok(inner.endpoints.values().cloned().collect())
    }

    async fn create(&self, req: &CreateEndpointRequest) -> Result<RemoteEndpoint, ApiError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(RecordedCall::Create(req.clone()));
        Self::take_fault(&mut inner, ApiCall::Create)?;

        if inner.endpoints.contains_key(&req.name) {
            return Err(ApiError::Validation(format!(
                "endpoint '{}' already exists",
                req.name
            )));
        }

        let mut ep = RemoteEndpoint {
            name: req.name.clone(),
            account_id: req.account_id.clone(),
            compute: req.compute.clone(),
            model: req.model.clone(),
            provider: req.provider.clone(),
            endpoint_type: req.endpoint_type.clone(),
            status: Some(pending_status(req.compute.scaling.min_replica)),
        };
        self.fill_defaults(&mut ep);
        inner.endpoints.insert(ep.name.clone(), ep.clone());
        Ok(ep)
    }

    async fn get(&self, name: &str) -> Result<RemoteEndpoint, ApiError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(RecordedCall::Get(name.to_string()));
        Self::take_fault(&mut inner, ApiCall::Get)?;
        inner.endpoints.get(name).cloned().ok_or(ApiError::NotFound)
    }

    async fn update(
        &self,
        name: &str,
        req: &UpdateEndpointRequest,
    ) -> Result<RemoteEndpoint, ApiError> {
        let mut inner = self.inner.write().await;
        inner
            .calls
            .push(RecordedCall::Update(name.to_string(), req.clone()));
        Self::take_fault(&mut inner, ApiCall::Update)?;

        let Some(current) = inner.endpoints.get(name) else {
            return Err(ApiError::NotFound);
        };
        let mut ep = current.clone();
        if let Some(compute) = &req.compute {
            ep.compute = compute.clone();
        }
        if let Some(model) = &req.model {
            ep.model = model.clone();
        }
        if let Some(t) = &req.endpoint_type {
            ep.endpoint_type = t.clone();
        }
        let status = ep
            .status
            .get_or_insert_with(|| pending_status(ep.compute.scaling.min_replica));
        status.state = "updating".to_string();
        status.updated_at = now_rfc3339();

        self.fill_defaults(&mut ep);
        inner.endpoints.insert(name.to_string(), ep.clone());
        Ok(ep)
    }

    async fn delete(&self, name: &str) -> Result<(), ApiError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(RecordedCall::Delete(name.to_string()));
        Self::take_fault(&mut inner, ApiCall::Delete)?;
        match inner.endpoints.remove(name) {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound),
        }
    }
}
