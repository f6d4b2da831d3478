//! First-match-wins probing over loosely-typed payloads.
//!
//! Autoline and SAP both drift in key casing, namespaces and envelope shape.
//! Every lookup in this crate is written as an ordered list of candidate
//! accessors; the first one producing a non-empty value wins and the result
//! records which accessor matched, so fallback chains can be tested on their own.

use serde_json::{Map, Value};

/// Outcome of a probe chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<M> {
    /// A non-empty value, plus the accessor that produced it.
    Found { value: String, method: M },
    NotFound,
}

impl<M> Probe<M> {
    pub fn value(&self) -> Option<&str> {
        match self {
            Probe::Found { value, .. } => Some(value),
            Probe::NotFound => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Probe::Found { value, .. } => Some(value),
            Probe::NotFound => None,
        }
    }

    pub fn method(&self) -> Option<&M> {
        match self {
            Probe::Found { method, .. } => Some(method),
            Probe::NotFound => None,
        }
    }

    /// Value or empty string. Mapped SAP fields are never omitted.
    pub fn or_empty(self) -> String {
        self.into_value().unwrap_or_default()
    }
}

/// How a record key was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    Exact(&'static str),
    CaseInsensitive(&'static str),
}

/// Coerces a JSON scalar into trimmed text.
///
/// Strings are trimmed, numbers use their decimal form. Everything else
/// (null, booleans, containers) counts as absent.
pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Probes a record for the first non-empty value among `aliases`.
///
/// All aliases are tried with exact keys first, then again ignoring case.
pub fn probe_key(record: &Map<String, Value>, aliases: &[&'static str]) -> Probe<KeyMatch> {
    for alias in aliases {
        if let Some(value) = record.get(*alias).and_then(scalar_text) {
            return Probe::Found {
                value,
                method: KeyMatch::Exact(alias),
            };
        }
    }

    for alias in aliases {
        let hit = record
            .iter()
            .filter(|(key, _)| key.as_str() != *alias && key.eq_ignore_ascii_case(alias))
            .find_map(|(_, value)| scalar_text(value));
        if let Some(value) = hit {
            return Probe::Found {
                value,
                method: KeyMatch::CaseInsensitive(alias),
            };
        }
    }

    Probe::NotFound
}

/// Shorthand for `probe_key(..).or_empty()`.
pub fn field(record: &Map<String, Value>, aliases: &[&'static str]) -> String {
    probe_key(record, aliases).or_empty()
}
