use std::fmt;

use serde_json::Value;

use quasar_common::{Endpoint, UNKNOWN_MARKER};

/// Where an endpoint sits relative to its desired state, as seen by a caller.
/// Nothing in this crate stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Desired state known, remote state not yet read.
    Planned,
    Applying,
    /// Remote state matches the desired state.
    Converged,
    /// A read shows the remote state differs.
    Drifted,
    Deleting,
    Absent,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Planned => "planned",
            Self::Applying => "applying",
            Self::Converged => "converged",
            Self::Drifted => "drifted",
            Self::Deleting => "deleting",
            Self::Absent => "absent",
        })
    }
}

/// Compare an observed endpoint against the desired one.
///
/// Only what the desired state sets is compared, so server-computed values
/// behind `Unset` or `Unknown` fields never count as drift. `env` maps are
/// compared whole.
pub fn assess(desired: &Endpoint, observed: Option<&Endpoint>) -> Phase {
    let Some(observed) = observed else {
        return Phase::Absent;
    };
    let (Ok(want), Ok(have)) = (
        serde_json::to_value(desired.without_status()),
        serde_json::to_value(observed.without_status()),
    ) else {
        return Phase::Drifted;
    };
    if covers(&want, &have) {
        Phase::Converged
    } else {
        Phase::Drifted
    }
}

// Keys whose maps are compared whole instead of field by field.
const WHOLE_KEYS: &[&str] = &["env"];

fn covers(want: &Value, have: &Value) -> bool {
    match (want, have) {
        // Deferred to the server: any observed value is fine.
        (Value::String(s), _) if s == UNKNOWN_MARKER => true,
        (Value::Object(w), Value::Object(h)) => w.iter().all(|(k, v)| match h.get(k) {
            Some(hv) if WHOLE_KEYS.contains(&k.as_str()) => v == hv,
            Some(hv) => covers(v, hv),
            None => false,
        }),
        _ => want == have,
    }
}
