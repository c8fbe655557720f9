use thiserror::Error;

use crate::endpoint::Endpoint;
use crate::image::Image;

const MAX_NAME_LEN: usize = 32;

/// A desired state that would be rejected before reaching the control plane.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid endpoint name '{name}': {reason}")]
    Name { name: String, reason: &'static str },

    #[error("field '{0}' must not be empty")]
    Empty(&'static str),

    #[error("min_replica ({min}) exceeds max_replica ({max})")]
    ReplicaRange { min: u32, max: u32 },
}

/// Check the name rule: 1–32 chars of `[a-z0-9-]`, not starting or ending with `-`.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let fail = |reason| {
        Err(ValidationError::Name {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return fail("must not be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return fail("must be at most 32 characters");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return fail("only lowercase letters, digits and '-' are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return fail("must not start or end with '-'");
    }
    Ok(())
}

fn non_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

impl Endpoint {
    /// Local sanity checks on a desired state. The reconciler does not call
    /// this; manifest loading does.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;

        non_empty(&self.endpoint_type, "type")?;
        non_empty(&self.cloud.region, "cloud.region")?;
        non_empty(&self.cloud.vendor, "cloud.vendor")?;
        non_empty(&self.model.framework, "model.framework")?;
        non_empty(&self.model.repository, "model.repository")?;
        non_empty(&self.compute.accelerator, "compute.accelerator")?;
        non_empty(&self.compute.instance_size, "compute.instance_size")?;
        non_empty(&self.compute.instance_type, "compute.instance_type")?;

        let scaling = &self.compute.scaling;
        if scaling.min_replica > scaling.max_replica {
            return Err(ValidationError::ReplicaRange {
                min: scaling.min_replica,
                max: scaling.max_replica,
            });
        }

        if let Some(server) = self.model.image.server() {
            non_empty(&server.url, "model.image.url")?;
        }
        if let Image::Llamacpp(llama) = &self.model.image {
            non_empty(&llama.model_path, "model.image.llamacpp.model_path")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Cloud, Compute, Model, Scaling};
    use crate::image::{HuggingfaceImage, LlamacppImage, ServerConfig, TeiImage};
    use crate::tristate::Tristate;
    use std::collections::BTreeMap;

    fn make_endpoint(image: Image) -> Endpoint {
        Endpoint {
            name: "embed-1".to_string(),
            account_id: Tristate::Unset,
            compute: Compute {
                accelerator: "cpu".to_string(),
                instance_size: "x2".to_string(),
                instance_type: "intel-icl".to_string(),
                scaling: Scaling {
                    min_replica: 1,
                    max_replica: 1,
                    scale_to_zero_timeout: Tristate::Unset,
                    measure: None,
                },
            },
            model: Model {
                framework: "pytorch".to_string(),
                repository: "BAAI/bge-small-en-v1.5".to_string(),
                revision: Tristate::Unset,
                task: Tristate::Value("sentence-embeddings".to_string()),
                env: BTreeMap::new(),
                image,
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
    fn test_valid_endpoint() {
        let ep = make_endpoint(Image::Tei(TeiImage {
            server: ServerConfig::new("ghcr.io/huggingface/tei:1.5"),
            ..Default::default()
        }));
        assert_eq!(ep.validate(), Ok(()));
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("svc-a").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("Svc").is_err());
        assert!(validate_name("-svc").is_err());
        assert!(validate_name("svc-").is_err());
        assert!(validate_name("svc_a").is_err());
        assert!(validate_name(&"a".repeat(33)).is_err());
        assert!(validate_name(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn test_replica_range() {
        let mut ep = make_endpoint(Image::Huggingface(HuggingfaceImage {}));
        ep.compute.scaling.min_replica = 3;
        ep.compute.scaling.max_replica = 1;
        assert_eq!(
            ep.validate(),
            Err(ValidationError::ReplicaRange { min: 3, max: 1 })
        );
    }

    #[test]
    fn test_server_image_requires_url() {
        let ep = make_endpoint(Image::Tei(TeiImage::default()));
        assert_eq!(ep.validate(), Err(ValidationError::Empty("model.image.url")));
    }

    #[test]
    fn test_llamacpp_requires_model_path() {
        let ep = make_endpoint(Image::Llamacpp(LlamacppImage {
            server: ServerConfig::new("ghcr.io/ggerganov/llama.cpp:server"),
            model_path: String::new(),
            ..Default::default()
        }));
        assert_eq!(
            ep.validate(),
            Err(ValidationError::Empty("model.image.llamacpp.model_path"))
        );
    }

    #[test]
    fn test_huggingface_needs_no_url() {
        let ep = make_endpoint(Image::Huggingface(HuggingfaceImage {}));
        assert_eq!(ep.validate(), Ok(()));
    }
}
