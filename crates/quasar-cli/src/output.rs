use chrono::{DateTime, Utc};

use quasar_common::Endpoint;
use quasar_core::Phase;

pub fn print_endpoint(ep: &Endpoint) {
    println!("\n=== Endpoint {} ===\n", ep.name);
    println!("  Type:       {}", ep.endpoint_type);
    println!("  Cloud:      {} / {}", ep.cloud.vendor, ep.cloud.region);
    println!(
        "  Instance:   {} {} ({})",
        ep.compute.accelerator, ep.compute.instance_type, ep.compute.instance_size
    );
    let scaling = &ep.compute.scaling;
    println!(
        "  Replicas:   {}..{} (scale to zero after {} min)",
        scaling.min_replica,
        scaling.max_replica,
        scaling.scale_to_zero_timeout
    );
    println!("  Repository: {}", ep.model.repository);
    println!("  Revision:   {}", ep.model.revision);
    println!("  Engine:     {}", ep.model.image.kind());
    if let Some(server) = ep.model.image.server() {
        println!("  Image:      {}", server.url);
        println!("  Port:       {}", server.port);
    }
    if !ep.model.env.is_empty() {
        println!("  Env:");
        for (k, v) in &ep.model.env {
            println!("    {k}={v}");
        }
    }

    if let Some(status) = &ep.status {
        println!("\n  [Status]");
        println!("  State:      {}", status.state);
        if !status.message.is_empty() {
            println!("  Message:    {}", status.message);
        }
        println!(
            "  Ready:      {}/{}",
            status.ready_replica, status.target_replica
        );
        println!("  URL:        {}", status.url.as_deref().unwrap_or("N/A"));
        if let Some(private) = &status.private {
            println!("  Service:    {}", private.service_name);
        }
        if let Some(err) = &status.error_message {
            println!("  Error:      {err}");
        }
        println!(
            "  Created:    {} by {}",
            age(&status.created_at),
            status.created_by.name
        );
        println!(
            "  Updated:    {} by {}",
            age(&status.updated_at),
            status.updated_by.name
        );
    }
    println!();
}

pub fn print_endpoints(endpoints: &[Endpoint]) {
    println!("\n=== Endpoints ===\n");
    if endpoints.is_empty() {
        println!("No endpoints found.");
        return;
    }
    println!(
        "{:<32} {:<12} {:<10} {:<10} {:<10}",
        "Name", "State", "Engine", "Ready", "Age"
    );
    println!("{:-<78}", "");
    for ep in endpoints {
        let (state, ready, created) = match &ep.status {
            Some(s) => (
                s.state.as_str(),
                format!("{}/{}", s.ready_replica, s.target_replica),
                age(&s.created_at),
            ),
            None => ("unknown", "-".to_string(), "-".to_string()),
        };
        println!(
            "{:<32} {:<12} {:<10} {:<10} {:<10}",
            ep.name,
            state,
            ep.model.image.kind(),
            ready,
            created
        );
    }
    println!();
}

pub fn print_phase(name: &str, phase: Phase) {
    let mark = match phase {
        Phase::Converged => "✓",
        Phase::Drifted | Phase::Absent => "✗",
        _ => "○",
    };
    println!("{mark} {name}: {phase}");
}

/// Human-readable age of an RFC 3339 timestamp; the raw text if it does not parse.
fn age(ts: &str) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(t) => format_age(Utc::now().signed_duration_since(t.with_timezone(&Utc))),
        Err(_) if ts.is_empty() => "-".to_string(),
        Err(_) => ts.to_string(),
    }
}

fn format_age(d: chrono::TimeDelta) -> String {
    let secs = d.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}
