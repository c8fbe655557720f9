use std::path::PathBuf;

use clap::{Parser, Subcommand};

use quasar_api::DEFAULT_API_URL;

#[derive(Debug, Parser)]
#[command(name = "quasar")]
#[command(about = "Reconcile inference endpoints against the control plane", long_about = None)]
pub struct Args {
    /// Control plane base URL
    #[arg(long, env = "QUASAR_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// User or organization owning the endpoints
    #[arg(long, env = "QUASAR_NAMESPACE")]
    pub namespace: String,

    /// API token (Authorization: Bearer)
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout
    #[arg(long, env = "QUASAR_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// OTLP/HTTP collector base URL (e.g. "http://127.0.0.1:4318")
    #[arg(long, env = "QUASAR_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Bearer token for the OTLP collector
    #[arg(long, env = "QUASAR_OTLP_TOKEN", hide_env_values = true)]
    pub otlp_token: Option<String>,

    /// File holding the last applied state
    #[arg(long, env = "QUASAR_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the endpoint, or update it if it already exists
    Apply {
        /// JSON manifest
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Update an existing endpoint
    Update {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
        /// Do not send the endpoint type
        #[arg(long)]
        keep_type: bool,
    },
    /// Show the current remote state
    Refresh { name: String },
    /// Delete an endpoint (succeeds if already gone)
    Destroy { name: String },
    /// List endpoints in the namespace
    List,
    /// Compare remote state against a manifest, or the saved state
    Drift {
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,
    },
}
