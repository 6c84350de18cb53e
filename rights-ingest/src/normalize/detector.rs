//! Record format classification

use serde::Serialize;
use serde_json::Value;

use super::aliases::{RELEASE_CONTAINERS, SUBMITTER_CONTAINERS, TRACK_LIST_CONTAINERS};

/// Shape of an incoming submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Uses the canonical `release` / `submitter` containers (or is ambiguous)
    Canonical,
    /// Uses alternative release, track-list and submitter containers
    Variant,
}

/// Classify a raw record
///
/// Canonical when both `release` and `submitter` objects are present at the
/// top level. Variant when a release-like container, a track list (top level
/// or inside the release-like container) and a submitter-like container are
/// all present. Anything else is treated as canonical; the validator reports
/// whatever is missing.
pub fn classify(record: &Value) -> RecordFormat {
    if has_canonical_containers(record) {
        return RecordFormat::Canonical;
    }

    let Some(map) = record.as_object() else {
        return RecordFormat::Canonical;
    };

    let release_like: Vec<&Value> = RELEASE_CONTAINERS
        .iter()
        .filter_map(|key| map.get(*key))
        .filter(|v| v.is_object())
        .collect();

    let has_track_list = TRACK_LIST_CONTAINERS.iter().any(|key| {
        map.get(*key).is_some_and(Value::is_array)
            || release_like
                .iter()
                .any(|container| container.get(*key).is_some_and(Value::is_array))
    });

    let has_submitter = SUBMITTER_CONTAINERS
        .iter()
        .any(|key| map.get(*key).is_some_and(Value::is_object));

    if !release_like.is_empty() && has_track_list && has_submitter {
        RecordFormat::Variant
    } else {
        RecordFormat::Canonical
    }
}

/// Both canonical containers present as objects
pub fn has_canonical_containers(record: &Value) -> bool {
    record.get("release").is_some_and(Value::is_object)
        && record.get("submitter").is_some_and(Value::is_object)
}
