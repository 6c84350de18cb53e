//! Party entries that arrive either as bare names or as objects
//!
//! Writers, performers and producers are converted to their struct form at
//! ingestion; nothing downstream re-checks the shape.

use serde_json::Value;

use super::aliases;
use super::locator::{locate_f64, locate_object, locate_str};
use crate::models::canonical::{
    Performer, Producer, Publisher, Writer, DEFAULT_PRODUCER_SPLIT, ROLE_COMPOSER,
    ROLE_MAIN_ARTIST, ROLE_PRODUCER,
};

/// One list entry, classified by shape
#[derive(Debug, Clone, Copy)]
pub enum StringOrStruct<'a> {
    Name(&'a str),
    Struct(&'a Value),
}

impl<'a> StringOrStruct<'a> {
    /// Classify an entry; blanks, numbers and nested lists are not parties
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(StringOrStruct::Name(s.trim())),
            Value::Object(map) if !map.is_empty() => Some(StringOrStruct::Struct(value)),
            _ => None,
        }
    }
}

/// Struct form of a party entry
pub trait PartyEntry: Sized {
    fn from_name(name: &str) -> Self;
    fn from_fields(fields: &Value) -> Self;
    fn name(&self) -> &str;

    fn from_entry(entry: StringOrStruct<'_>) -> Self {
        match entry {
            StringOrStruct::Name(name) => Self::from_name(name),
            StringOrStruct::Struct(fields) => Self::from_fields(fields),
        }
    }
}

/// Convert a list value (or a single entry) into struct-form parties
///
/// Entries without a usable name are dropped.
pub fn ingest_parties<T: PartyEntry>(value: &Value) -> Vec<T> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    entries
        .into_iter()
        .filter_map(StringOrStruct::classify)
        .map(T::from_entry)
        .filter(|party| !party.name().trim().is_empty())
        .collect()
}

fn name_of(fields: &Value) -> String {
    locate_str(fields, aliases::PARTY_NAME).unwrap_or_default()
}

impl PartyEntry for Writer {
    fn from_name(name: &str) -> Self {
        Writer::named(name)
    }

    fn from_fields(fields: &Value) -> Self {
        let publisher = match locate_object(fields, &["publisher"]) {
            Some(p) => Some(Publisher {
                name: name_of(p),
                ipi: locate_str(p, aliases::PARTY_IPI).unwrap_or_default(),
                split: locate_f64(p, aliases::PARTY_SPLIT).unwrap_or(50.0),
            }),
            None => locate_str(fields, &["publisher"]).map(|name| Publisher {
                name,
                ipi: String::new(),
                split: 50.0,
            }),
        };

        Writer {
            name: name_of(fields),
            ipi: locate_str(fields, aliases::PARTY_IPI).unwrap_or_default(),
            role: locate_str(fields, aliases::PARTY_ROLE).unwrap_or_else(|| ROLE_COMPOSER.to_string()),
            split: locate_f64(fields, aliases::PARTY_SPLIT).unwrap_or(100.0),
            publisher,
            pro: locate_str(fields, aliases::PARTY_PRO).unwrap_or_default(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl PartyEntry for Performer {
    fn from_name(name: &str) -> Self {
        Performer::named(name)
    }

    fn from_fields(fields: &Value) -> Self {
        Performer {
            name: name_of(fields),
            isni: locate_str(fields, aliases::PARTY_ISNI),
            role: locate_str(fields, aliases::PARTY_ROLE)
                .unwrap_or_else(|| ROLE_MAIN_ARTIST.to_string()),
            split: locate_f64(fields, aliases::PARTY_SPLIT).unwrap_or(100.0),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl PartyEntry for Producer {
    fn from_name(name: &str) -> Self {
        Producer::named(name)
    }

    fn from_fields(fields: &Value) -> Self {
        Producer {
            name: name_of(fields),
            role: locate_str(fields, aliases::PARTY_ROLE).unwrap_or_else(|| ROLE_PRODUCER.to_string()),
            split: locate_f64(fields, aliases::PARTY_SPLIT).unwrap_or(DEFAULT_PRODUCER_SPLIT),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
