//! Field-level corrections to canonical metadata
//!
//! A correction names a canonical field path (dotted, or the bracketed form
//! validation reports use) and the value to put there. Corrections are
//! applied to the JSON form of the record and the result is parsed back, so
//! a value of the wrong shape is refused instead of silently dropped.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::locator::{is_present, set_path, walk, PathError};
use crate::models::CanonicalMetadata;

/// One correction
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

/// A single correction or a batch, as sent by clients
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldUpdates {
    One(FieldUpdate),
    Many(Vec<FieldUpdate>),
}

impl FieldUpdates {
    pub fn into_vec(self) -> Vec<FieldUpdate> {
        match self {
            FieldUpdates::One(update) => vec![update],
            FieldUpdates::Many(updates) => updates,
        }
    }
}

#[derive(Debug, Error)]
pub enum AmendError {
    #[error("no field updates given")]
    Empty,

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("`{path}`: {message}")]
    Shape { path: String, message: String },

    #[error("`{0}` is not a canonical metadata field")]
    UnknownField(String),
}

/// Apply `updates` in order and return the corrected record
///
/// All or nothing: the first failing update aborts and `metadata` is left
/// as it was. A number or boolean written over a text field is stored as
/// text, since identifiers like UPCs often arrive as numbers.
pub fn apply_updates(
    metadata: &CanonicalMetadata,
    updates: &[FieldUpdate],
) -> Result<CanonicalMetadata, AmendError> {
    if updates.is_empty() {
        return Err(AmendError::Empty);
    }

    let mut document = serde_json::to_value(metadata).map_err(|e| AmendError::Shape {
        path: String::new(),
        message: e.to_string(),
    })?;

    for update in updates {
        let value = coerce_to_existing(&document, &update.path, update.value.clone());
        set_path(&mut document, &update.path, value)?;

        // Parse after every step so the error names the offending path
        if let Err(e) = serde_json::from_value::<CanonicalMetadata>(document.clone()) {
            return Err(AmendError::Shape {
                path: update.path.clone(),
                message: e.to_string(),
            });
        }
    }

    let amended: CanonicalMetadata =
        serde_json::from_value(document).map_err(|e| AmendError::Shape {
            path: String::new(),
            message: e.to_string(),
        })?;

    // Keys the schema does not know are dropped by parsing; refuse them
    let reparsed = serde_json::to_value(&amended).unwrap_or_default();
    if let Some(unknown) = updates
        .iter()
        .find(|u| is_present(&u.value) && walk(&reparsed, &dotted(&u.path)).is_none())
    {
        return Err(AmendError::UnknownField(unknown.path.clone()));
    }

    Ok(amended)
}

fn dotted(path: &str) -> String {
    path.replace('[', ".").replace(']', "")
}

fn coerce_to_existing(document: &Value, path: &str, value: Value) -> Value {
    match (walk(document, &dotted(path)), &value) {
        (Some(Value::String(_)), Value::Number(n)) => Value::String(n.to_string()),
        (Some(Value::String(_)), Value::Bool(b)) => Value::String(b.to_string()),
        _ => value,
    }
}
