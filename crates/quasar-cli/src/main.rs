mod args;
mod config;
mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use quasar_api::HttpEndpointApi;
use quasar_common::telemetry::init_tracing;
use quasar_common::Tristate;
use quasar_core::{assess, Reconciler};

use crate::args::{Args, Command};
use crate::config::{api_config, clear_state, load_manifest, load_state, save_state};
use crate::output::{print_endpoint, print_endpoints, print_phase};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_tracing(
        "quasar",
        args.otlp_endpoint.as_deref(),
        args.otlp_token.as_deref(),
    );

    let api = HttpEndpointApi::new(api_config(&args)).context("failed to build HTTP client")?;
    let reconciler = Reconciler::new(api);

    match args.command {
        Command::Apply { file } => {
            let desired = load_manifest(&file)?;
            let applied = reconciler.apply(&desired).await?;
            if let Some(path) = &args.state {
                save_state(path, &applied)?;
                info!(path = %path.display(), "state saved");
            }
            println!("✓ Endpoint '{}' applied", applied.name);
            print_endpoint(&applied);
        }
        Command::Update { file, keep_type } => {
            let desired = load_manifest(&file)?;
            let endpoint_type = if keep_type {
                Tristate::Unset
            } else {
                Tristate::Value(desired.endpoint_type.clone())
            };
            let updated = reconciler.update_with(&desired, endpoint_type).await?;
            if let Some(path) = &args.state {
                save_state(path, &updated)?;
            }
            println!("✓ Endpoint '{}' updated", updated.name);
            print_endpoint(&updated);
        }
        Command::Refresh { name } => match reconciler.refresh(&name).await? {
            Some(ep) => print_endpoint(&ep),
            None => println!("○ Endpoint '{}' does not exist", name),
        },
        Command::Destroy { name } => {
            reconciler.destroy(&name).await?;
            if let Some(path) = &args.state {
                if clear_state(path, &name)? {
                    info!(path = %path.display(), "state cleared");
                }
            }
            println!("✓ Endpoint '{}' destroyed", name);
        }
        Command::List => {
            let endpoints = reconciler.list().await?;
            print_endpoints(&endpoints);
        }
        Command::Drift { file } => {
            let desired = match (file, &args.state) {
                (Some(file), _) => load_manifest(&file)?,
                (None, Some(path)) => match load_state(path)? {
                    Some(state) => {
                        info!(saved_at = %state.saved_at, "comparing against saved state");
                        state.endpoint
                    }
                    None => bail!("no manifest given and state file {} is empty", path.display()),
                },
                (None, None) => bail!("drift needs --file or --state"),
            };
            let observed = reconciler.refresh(&desired.name).await?;
            let phase = assess(&desired, observed.as_ref());
            if observed.is_none() {
                warn!(name = %desired.name, "endpoint missing remotely");
            }
            print_phase(&desired.name, phase);
        }
    }

    Ok(())
}
