//! Read path: remote representation to canonical state.

use quasar_api::{RemoteEndpoint, RemoteStatus};
use quasar_common::{
    Actor, Cloud, Compute, Endpoint, EndpointStatus, Measure, Model, PrivateService, Scaling,
};

use crate::error::MappingError;
use crate::mapping::image::image_from_remote;

/// Canonical state for a remote endpoint.
///
/// Present optional fields become `Value`, absent ones `Unset`; `Unknown` is
/// never produced. A missing `env` becomes an empty map and `status` is copied
/// as received.
pub fn to_desired_state(remote: &RemoteEndpoint) -> Result<Endpoint, MappingError> {
    let image = image_from_remote(&remote.model.image)?;
    let scaling = &remote.compute.scaling;

    Ok(Endpoint {
        name: remote.name.clone(),
        account_id: remote.account_id.clone().into(),
        compute: Compute {
            accelerator: remote.compute.accelerator.clone(),
            instance_size: remote.compute.instance_size.clone(),
            instance_type: remote.compute.instance_type.clone(),
            scaling: Scaling {
                min_replica: scaling.min_replica,
                max_replica: scaling.max_replica,
                scale_to_zero_timeout: scaling.scale_to_zero_timeout.into(),
                measure: scaling.measure.as_ref().map(|m| Measure {
                    hardware_usage: m.hardware_usage.into(),
                    pending_requests: m.pending_requests.into(),
                }),
            },
        },
        model: Model {
            framework: remote.model.framework.clone(),
            repository: remote.model.repository.clone(),
            revision: remote.model.revision.clone().into(),
            task: remote.model.task.clone().into(),
            env: remote.model.env.clone().unwrap_or_default(),
            image,
        },
        cloud: Cloud {
            region: remote.provider.region.clone(),
            vendor: remote.provider.vendor.clone(),
        },
        endpoint_type: remote.endpoint_type.clone(),
        status: remote.status.as_ref().map(status_from_remote),
    })
}

fn status_from_remote(s: &RemoteStatus) -> EndpointStatus {
    EndpointStatus {
        state: s.state.clone(),
        message: s.message.clone(),
        ready_replica: s.ready_replica,
        target_replica: s.target_replica,
        url: s.url.clone(),
        error_message: s.error_message.clone(),
        private: s.private.as_ref().map(|p| PrivateService {
            service_name: p.service_name.clone(),
        }),
        created_at: s.created_at.clone(),
        created_by: Actor {
            id: s.created_by.id.clone(),
            name: s.created_by.name.clone(),
        },
        updated_at: s.updated_at.clone(),
        updated_by: Actor {
            id: s.updated_by.id.clone(),
            name: s.updated_by.name.clone(),
        },
    }
}
