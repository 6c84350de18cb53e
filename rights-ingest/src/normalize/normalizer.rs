//! Normalizer: arbitrary-shaped submission → canonical metadata
//!
//! Records that already carry the canonical `release` and `submitter`
//! containers pass through unchanged (parsed leniently). Everything else is
//! mapped field by field through the alias table.
//!
//! A true variant record (release-like, track-list-like and submitter-like
//! containers all present) gets the full skeleton: today's release date, an
//! `album` release type and a submission timestamp. Ambiguous records such as
//! a flat `{title, tracks, submitter}` object get structural defaults only,
//! so their gaps are reported instead of papered over.
//!
//! Never fails. The worst case is a near-empty record with a large
//! unresolved set.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use super::aliases;
use super::detector::{classify, has_canonical_containers, RecordFormat};
use super::locator::{
    locate, locate_array, locate_bool, locate_f64, locate_object, locate_str,
    locate_string_list, locate_u32,
};
use super::resolver::{FieldResolver, NoopResolver};
use super::shape::ingest_parties;
use crate::models::canonical::{
    CanonicalMetadata, CompositionRights, Label, Performer, RecordingRights, Release,
    ReleaseType, Submitter, Track, Writer, DEFAULT_LANGUAGE, DEFAULT_MASTER_SHARE, WORLDWIDE,
};
use crate::validators::validate;

/// How blanks in required fields are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Leave blanks for the validator to report
    #[default]
    Plain,
    /// Ask the resolver, then synthesize clearly marked placeholders
    BestEffortFill,
}

/// Where a best-effort value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillSource {
    Resolver,
    Placeholder,
}

/// Result of normalizing one record
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationOutcome {
    pub metadata: CanonicalMetadata,
    /// Required field paths still lacking a real value (placeholder fills included)
    pub unresolved: BTreeSet<String>,
    pub format: RecordFormat,
    /// Paths filled in best-effort mode
    pub filled: BTreeMap<String, FillSource>,
}

impl NormalizationOutcome {
    /// More than half of the tracked required paths are unresolved
    ///
    /// The input most likely matched no known shape.
    pub fn is_low_confidence(&self) -> bool {
        let tracked = 7 + 4 * self.metadata.release.tracks.len().max(1);
        self.unresolved.len() * 2 > tracked
    }
}

/// Normalize in plain mode
pub fn normalize(record: &Value) -> NormalizationOutcome {
    normalize_with(record, NormalizeMode::Plain, &NoopResolver)
}

/// Normalize with an explicit fill mode and resolver
pub fn normalize_with(
    record: &Value,
    mode: NormalizeMode,
    resolver: &dyn FieldResolver,
) -> NormalizationOutcome {
    let format = classify(record);

    let mut metadata = if has_canonical_containers(record) {
        match serde_json::from_value::<CanonicalMetadata>(record.clone()) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(error = %e, "Canonical containers did not parse, mapping through aliases");
                lift(record, Defaults::Structural)
            }
        }
    } else if format == RecordFormat::Variant {
        lift(record, Defaults::Full)
    } else {
        lift(record, Defaults::Structural)
    };

    let filled = match mode {
        NormalizeMode::Plain => BTreeMap::new(),
        NormalizeMode::BestEffortFill => fill_missing(&mut metadata, record, resolver),
    };

    let mut unresolved: BTreeSet<String> = validate(&metadata).missing_fields.into_iter().collect();
    unresolved.extend(
        filled
            .iter()
            .filter(|(_, source)| **source == FillSource::Placeholder)
            .map(|(path, _)| path.clone()),
    );

    debug!(
        format = ?format,
        tracks = metadata.release.tracks.len(),
        unresolved = unresolved.len(),
        filled = filled.len(),
        "Normalized submission"
    );

    NormalizationOutcome {
        metadata,
        unresolved,
        format,
        filled,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Defaults {
    /// Skeleton plus today's date, `album` type and a submission timestamp
    Full,
    /// Skeleton only
    Structural,
}

fn lift(record: &Value, defaults: Defaults) -> CanonicalMetadata {
    let full = defaults == Defaults::Full;
    let now = chrono::Utc::now();

    let release_type = locate_str(record, aliases::RELEASE_TYPE)
        .and_then(|label| ReleaseType::from_label(&label))
        .or(full.then_some(ReleaseType::Album));

    let release_date = locate_str(record, aliases::RELEASE_DATE)
        .or_else(|| full.then(|| now.date_naive().format("%Y-%m-%d").to_string()))
        .unwrap_or_default();

    let mut territories = ordered_set(locate_string_list(record, aliases::TERRITORIES));
    if territories.is_empty() {
        territories.push(WORLDWIDE.to_string());
    }

    let release = Release {
        title: locate_str(record, aliases::RELEASE_TITLE).unwrap_or_default(),
        release_type,
        upc: locate_str(record, aliases::RELEASE_UPC)
            .map(|upc| normalize_upc(&upc))
            .unwrap_or_default(),
        catalog_number: locate_str(record, aliases::RELEASE_CATALOG_NUMBER).unwrap_or_default(),
        release_date,
        label: Label {
            name: locate_str(record, aliases::LABEL_NAME).unwrap_or_default(),
            id: locate_str(record, aliases::LABEL_ID).unwrap_or_default(),
        },
        genre: ordered_set(locate_string_list(record, aliases::GENRES)),
        territories,
        distribution_platforms: ordered_set(locate_string_list(
            record,
            aliases::DISTRIBUTION_PLATFORMS,
        )),
        tracks: lift_tracks(record),
    };

    let submitter = Submitter {
        name: locate_str(record, aliases::SUBMITTER_NAME).unwrap_or_default(),
        role: locate_str(record, aliases::SUBMITTER_ROLE).unwrap_or_default(),
        wallet_address: locate_str(record, aliases::SUBMITTER_WALLET).unwrap_or_default(),
        email: locate_str(record, aliases::SUBMITTER_EMAIL).unwrap_or_default(),
        timestamp: locate_str(record, aliases::SUBMITTER_TIMESTAMP)
            .or_else(|| full.then(|| now.to_rfc3339()))
            .unwrap_or_default(),
        signature: locate_str(record, aliases::SUBMITTER_SIGNATURE).unwrap_or_default(),
    };

    CanonicalMetadata { release, submitter }
}

fn lift_tracks(record: &Value) -> Vec<Track> {
    let Some(items) = locate_array(record, aliases::TRACK_LISTS) else {
        return Vec::new();
    };

    let release_artists: Vec<Performer> = locate(record, aliases::RELEASE_ARTIST)
        .map(ingest_parties)
        .unwrap_or_default();

    let mut tracks: Vec<Track> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| lift_track(index, item, &release_artists))
        .collect();

    assign_positions(&mut tracks);
    tracks
}

fn lift_track(index: usize, item: &Value, release_artists: &[Performer]) -> Option<Track> {
    let default_position = index as u32 + 1;

    match item {
        Value::String(title) if !title.trim().is_empty() => {
            let mut track = Track::skeleton(default_position);
            track.title = title.trim().to_string();
            track.composition.title = track.title.clone();
            track.recording.performers = release_artists.to_vec();
            return Some(track);
        }
        Value::Object(_) => {}
        _ => return None,
    }

    let mut track = Track::skeleton(locate_u32(item, aliases::TRACK_POSITION).unwrap_or(default_position));
    track.title = locate_str(item, aliases::TRACK_TITLE).unwrap_or_default();
    track.duration = locate_str(item, aliases::TRACK_DURATION).unwrap_or_default();
    track.isrc = locate_str(item, aliases::TRACK_ISRC)
        .map(|isrc| normalize_isrc(&isrc))
        .unwrap_or_default();
    track.explicit = locate_bool(item, aliases::TRACK_EXPLICIT).unwrap_or(false);
    track.language =
        locate_str(item, aliases::TRACK_LANGUAGE).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    track.ledger_metadata = locate_object(item, aliases::TRACK_LEDGER_METADATA).cloned();

    // Composition
    track.composition.title =
        locate_str(item, aliases::COMPOSITION_TITLE).unwrap_or_else(|| track.title.clone());
    track.composition.iswc = locate_str(item, aliases::COMPOSITION_ISWC)
        .map(|iswc| iswc.to_ascii_uppercase())
        .unwrap_or_default();
    track.composition.writers = locate(item, aliases::WRITERS)
        .map(ingest_parties::<Writer>)
        .unwrap_or_default();
    if let Some(rights) = locate_object(item, aliases::COMPOSITION_RIGHTS) {
        track.composition.rights =
            serde_json::from_value::<CompositionRights>(rights.clone()).unwrap_or_default();
    }

    // Recording
    let explicit_performers: Vec<Performer> = locate(item, aliases::PERFORMERS)
        .map(ingest_parties)
        .unwrap_or_default();
    track.recording.performers = if !explicit_performers.is_empty() {
        explicit_performers
    } else {
        let track_artists: Vec<Performer> = locate(item, aliases::TRACK_ARTIST)
            .map(ingest_parties)
            .unwrap_or_default();
        if track_artists.is_empty() {
            release_artists.to_vec()
        } else {
            track_artists
        }
    };
    track.recording.producers = locate(item, aliases::PRODUCERS)
        .map(ingest_parties)
        .unwrap_or_default();
    track.recording.master_owner.name =
        locate_str(item, aliases::MASTER_OWNER_NAME).unwrap_or_default();
    track.recording.master_owner.percentage =
        locate_f64(item, aliases::MASTER_OWNER_SHARE).unwrap_or(DEFAULT_MASTER_SHARE);
    if let Some(rights) = locate_object(item, aliases::RECORDING_RIGHTS) {
        if let Ok(rights) = serde_json::from_value::<RecordingRights>(rights.clone()) {
            track.recording.rights = rights;
        }
    }

    Some(track)
}

/// Keep given positions when they are positive and unique, otherwise
/// renumber in sequence order. Tracks end up sorted by position.
fn assign_positions(tracks: &mut [Track]) {
    let mut seen = HashSet::new();
    let usable = tracks.iter().all(|t| t.position > 0 && seen.insert(t.position));

    if usable {
        tracks.sort_by_key(|t| t.position);
    } else {
        for (index, track) in tracks.iter_mut().enumerate() {
            track.position = index as u32 + 1;
        }
    }
}

/// Uppercase and hyphenate to `XX-XXX-YY-NNNNN` when all 12 significant
/// characters are present; otherwise return the trimmed, uppercased input.
pub fn normalize_isrc(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_uppercase();

    let well_formed = compact.len() == 12
        && compact[..2].chars().all(|c| c.is_ascii_alphabetic())
        && compact[5..].chars().all(|c| c.is_ascii_digit());

    if well_formed {
        format!(
            "{}-{}-{}-{}",
            &compact[..2],
            &compact[2..5],
            &compact[5..7],
            &compact[7..]
        )
    } else {
        raw.trim().to_ascii_uppercase()
    }
}

/// Digits only, when the input is made of digits, spaces and dashes
pub fn normalize_upc(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        trimmed.chars().filter(char::is_ascii_digit).collect()
    } else {
        trimmed.to_string()
    }
}

fn ordered_set(list: Option<Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in list.unwrap_or_default() {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn fill_missing(
    metadata: &mut CanonicalMetadata,
    raw: &Value,
    resolver: &dyn FieldResolver,
) -> BTreeMap<String, FillSource> {
    let mut filled = BTreeMap::new();

    if metadata.release.tracks.is_empty() {
        metadata.release.tracks.push(Track::skeleton(1));
        filled.insert("release.tracks".to_string(), FillSource::Placeholder);
    }

    for path in validate(metadata).missing_fields {
        let resolved = resolver
            .resolve(&path, raw)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let (value, source) = match resolved {
            Some(value) => (value, FillSource::Resolver),
            None => (placeholder_for(metadata, &path), FillSource::Placeholder),
        };

        if apply_fill(metadata, &path, &value) {
            debug!(path = %path, source = ?source, "Filled required field");
            filled.insert(path, source);
        }
    }

    filled
}

fn placeholder_for(metadata: &CanonicalMetadata, path: &str) -> String {
    if let Some((index, field)) = split_track_path(path) {
        let position = metadata
            .release
            .tracks
            .get(index)
            .map(|t| t.position)
            .unwrap_or(index as u32 + 1);
        return match field {
            "title" => format!("Track {}", position),
            "isrc" => format!("ISRC-PLACEHOLDER-{}", position),
            "composition.writers" => "Unknown Writer".to_string(),
            "recording.performers" => "Unknown Artist".to_string(),
            _ => String::new(),
        };
    }

    match path {
        "release.title" => "Unknown Title".to_string(),
        "release.type" => ReleaseType::Album.as_str().to_string(),
        "release.upc" => "UPC-PLACEHOLDER".to_string(),
        "release.releaseDate" => chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        "submitter.name" => "Unknown Submitter".to_string(),
        "submitter.role" => "Creator".to_string(),
        _ => String::new(),
    }
}

/// Write a value to a required path; false for paths this cannot fill
fn apply_fill(metadata: &mut CanonicalMetadata, path: &str, value: &str) -> bool {
    if let Some((index, field)) = split_track_path(path) {
        let Some(track) = metadata.release.tracks.get_mut(index) else {
            return false;
        };
        match field {
            "title" => track.title = value.to_string(),
            "isrc" => track.isrc = normalize_isrc(value),
            "composition.writers" => track.composition.writers.push(Writer::named(value)),
            "recording.performers" => track.recording.performers.push(Performer::named(value)),
            _ => return false,
        }
        return true;
    }

    let release = &mut metadata.release;
    match path {
        "release.title" => release.title = value.to_string(),
        "release.type" => {
            release.release_type = ReleaseType::from_label(value).or(Some(ReleaseType::Album))
        }
        "release.upc" => release.upc = normalize_upc(value),
        "release.releaseDate" => release.release_date = value.to_string(),
        "submitter.name" => metadata.submitter.name = value.to_string(),
        "submitter.role" => metadata.submitter.role = value.to_string(),
        _ => return false,
    }
    true
}

/// `release.tracks[3].isrc` → `(3, "isrc")`
fn split_track_path(path: &str) -> Option<(usize, &str)> {
    let rest = path.strip_prefix("release.tracks[")?;
    let (index, field) = rest.split_once("].")?;
    Some((index.parse().ok()?, field))
}
