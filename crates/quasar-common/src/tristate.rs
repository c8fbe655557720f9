use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Manifest literal that marks a field as left for the server to compute.
pub const UNKNOWN_MARKER: &str = "(known after apply)";

/// An optional field that keeps "not set by the caller" apart from a value.
///
/// - `Unset`: the caller said nothing. Omitted from outbound payloads; also
///   what an absent inbound field becomes.
/// - `Unknown`: the caller defers to the server. Also omitted outbound, but
///   only ever appears on the desired side.
/// - `Value(v)`: an explicit value, sent as-is and captured as-is on reads.
///
/// There is no null state: an explicit JSON `null` reads as `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate<T> {
    Unset,
    Unknown,
    Value(T),
}

impl<T> Default for Tristate<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Tristate<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Collapse to the wire representation: only `Value` survives.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Clone> Tristate<T> {
    pub fn cloned_option(&self) -> Option<T> {
        self.value().cloned()
    }
}

impl<T> From<Option<T>> for Tristate<T> {
    /// Inbound conversion. Never yields `Unknown`.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Unset,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Tristate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("-"),
            Self::Unknown => f.write_str(UNKNOWN_MARKER),
            Self::Value(v) => v.fmt(f),
        }
    }
}

// Canonical fields are declared with
// `#[serde(default, skip_serializing_if = "Tristate::is_unset")]`: `Unknown`
// is written as the marker so it survives a save and reload. Wire types use
// `Option` and never see it.
impl<T: Serialize> Serialize for Tristate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unknown => serializer.serialize_str(UNKNOWN_MARKER),
            Self::Unset => serializer.serialize_none(),
        }
    }
}

struct UnknownMarker;

impl<'de> Deserialize<'de> for UnknownMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == UNKNOWN_MARKER {
            Ok(UnknownMarker)
        } else {
            Err(de::Error::custom("not the unknown marker"))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr<T> {
    Unknown(UnknownMarker),
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Tristate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Repr<T>>::deserialize(deserializer)? {
            None => Self::Unset,
            Some(Repr::Unknown(_)) => Self::Unknown,
            Some(Repr::Value(v)) => Self::Value(v),
        })
    }
}
