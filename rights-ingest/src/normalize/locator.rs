//! Dotted-path lookup over arbitrary JSON records
//!
//! A path is a dot-separated list of segments. Object segments are keys;
//! numeric segments index into arrays (`tracks.0.title`). A path that walks
//! into a scalar, a missing key or an out-of-range index is simply absent.
//!
//! "Present" means not null, not a blank string, not an empty array and not
//! an empty object. The first present alias wins; alias order is the only
//! tie-break.
//!
//! [`set_path`] writes through the same path syntax and also accepts the
//! bracketed index form used in validation reports (`tracks[0].title`).

use serde_json::{Map, Value};
use thiserror::Error;

/// A value could not be written at a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed path `{0}`")]
    Malformed(String),

    #[error("`{path}`: `{segment}` is a {found}, not an object or array")]
    NotAContainer {
        path: String,
        segment: String,
        found: &'static str,
    },

    #[error("`{path}`: index {index} is past the end of a {len}-element array")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

/// Walk one dotted path
pub fn walk<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = record;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Is this value worth reporting as found?
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// First present value among `aliases`
pub fn locate<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find(|v| is_present(v))
}

/// First alias whose value can be read as text
///
/// Numbers and booleans are stringified (a UPC is often sent as a number).
/// Values of other shapes are skipped so a later alias can still match.
pub fn locate_str(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find_map(as_text)
}

/// First alias readable as a boolean (`true`, `"yes"`, `"1"`, `1`)
pub fn locate_bool(record: &Value, aliases: &[&str]) -> Option<bool> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find_map(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
}

/// First alias readable as a non-negative integer (number or numeric string)
pub fn locate_u32(record: &Value, aliases: &[&str]) -> Option<u32> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find_map(|v| match v {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

/// First alias readable as a number (number or numeric string, `%` allowed)
pub fn locate_f64(record: &Value, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
            _ => None,
        })
}

/// First alias readable as a list of strings
///
/// Accepts an array of strings (blank entries dropped) or a single string,
/// which is split on commas.
pub fn locate_string_list(record: &Value, aliases: &[&str]) -> Option<Vec<String>> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find_map(|v| {
            let list: Vec<String> = match v {
                Value::Array(items) => items.iter().filter_map(as_text).collect(),
                Value::String(s) => s
                    .split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect(),
                _ => return None,
            };
            (!list.is_empty()).then_some(list)
        })
}

/// First alias holding a non-empty array
pub fn locate_array<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a Vec<Value>> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find_map(|v| match v {
            Value::Array(items) if !items.is_empty() => Some(items),
            _ => None,
        })
}

/// First alias holding a non-empty object
pub fn locate_object<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|path| walk(record, path))
        .find(|v| matches!(v, Value::Object(map) if !map.is_empty()))
}

/// Split a path into segments, turning `name[3]` into `name`, `3`
fn segments(path: &str) -> Option<Vec<&str>> {
    let mut out = Vec::new();
    for part in path.split('.') {
        let (head, mut rest) = match part.find('[') {
            Some(at) => part.split_at(at),
            None => (part, ""),
        };
        if head.is_empty() {
            return None;
        }
        out.push(head);
        while !rest.is_empty() {
            let close = rest.find(']')?;
            let index = &rest[1..close];
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            out.push(index);
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return None;
            }
        }
    }
    Some(out)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Write `value` at `path`, creating missing objects on the way
///
/// Numeric segments index arrays; an index equal to the array length
/// appends. Nulls along the path become objects. Anything else that is not a
/// container stops the write and leaves `record` unchanged.
pub fn set_path(record: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let malformed = || PathError::Malformed(path.to_string());
    let segments = segments(path).ok_or_else(malformed)?;
    let (last, parents) = segments.split_last().ok_or_else(malformed)?;

    let mut current = record;
    for segment in parents {
        current = child_mut(current, path, segment)?;
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Array(items) => {
            let index: usize = last.parse().map_err(|_| malformed())?;
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => items[index] = value,
                std::cmp::Ordering::Equal => items.push(value),
                std::cmp::Ordering::Greater => {
                    return Err(PathError::IndexOutOfRange {
                        path: path.to_string(),
                        index,
                        len: items.len(),
                    })
                }
            }
        }
        Value::Object(map) => {
            map.insert(last.to_string(), value);
        }
        other => {
            return Err(PathError::NotAContainer {
                path: path.to_string(),
                segment: last.to_string(),
                found: kind_of(other),
            })
        }
    }
    Ok(())
}

fn child_mut<'a>(
    current: &'a mut Value,
    path: &str,
    segment: &str,
) -> Result<&'a mut Value, PathError> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index: usize = segment
                .parse()
                .map_err(|_| PathError::Malformed(path.to_string()))?;
            let len = items.len();
            if index == len {
                items.push(Value::Object(Map::new()));
            }
            items.get_mut(index).ok_or(PathError::IndexOutOfRange {
                path: path.to_string(),
                index,
                len,
            })
        }
        other => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: segment.to_string(),
            found: kind_of(other),
        }),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
