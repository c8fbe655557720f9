use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quasar_api::HttpApiConfig;
use quasar_common::Endpoint;

use crate::args::Args;

pub fn api_config(args: &Args) -> HttpApiConfig {
    HttpApiConfig {
        base_url: args.api_url.clone(),
        namespace: args.namespace.clone(),
        token: args.token.clone().filter(|t| !t.is_empty()),
        timeout: Duration::from_secs(args.timeout_secs),
    }
}

/// Read and validate a desired-state manifest.
pub fn load_manifest(path: &Path) -> Result<Endpoint> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest(&raw).with_context(|| format!("invalid manifest {}", path.display()))
}

fn parse_manifest(raw: &str) -> Result<Endpoint> {
    let endpoint: Endpoint = serde_json::from_str(raw)?;
    endpoint.validate()?;
    Ok(endpoint)
}

/// Last state returned by a successful apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedState {
    pub endpoint: Endpoint,
    pub saved_at: DateTime<Utc>,
}

pub fn load_state(path: &Path) -> Result<Option<SavedState>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state {}", path.display()))?;
    let state = serde_json::from_str(&raw)
        .with_context(|| format!("corrupt state file {}", path.display()))?;
    Ok(Some(state))
}

pub fn save_state(path: &Path, endpoint: &Endpoint) -> Result<()> {
    let state = SavedState {
        endpoint: endpoint.clone(),
        saved_at: Utc::now(),
    };
    let raw = serde_json::to_string_pretty(&state)?;
    std::fs::write(path, raw).with_context(|| format!("failed to write state {}", path.display()))
}

/// Remove the state file if it tracks `name`. Returns whether it did.
pub fn clear_state(path: &Path, name: &str) -> Result<bool> {
    match load_state(path)? {
        Some(state) if state.endpoint.name == name => {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove state {}", path.display()))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}
