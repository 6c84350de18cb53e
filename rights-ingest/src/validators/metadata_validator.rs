//! Metadata Validator
//!
//! Checks a canonical record against required-field and identifier-format rules.
//!
//! # Rules
//! - **Required**: `release.title`, `release.type`, `release.upc`,
//!   `release.releaseDate`, at least one track; per track a title, an ISRC,
//!   one named writer and one named performer; `submitter.name`,
//!   `submitter.role`.
//! - **Format** (only on non-blank values): UPC `^\d{12,13}$`, release date
//!   `^\d{4}-\d{2}-\d{2}$`, ISRC `^[A-Z]{2}-?\w{3}-?\d{2}-?\d{5}$`, track
//!   positions positive and unique.
//! - **Registration**: `submitter.walletAddress` and `submitter.signature`
//!   are needed on-chain only and reported separately.
//!
//! Every check runs; nothing short-circuits. Results are sorted and
//! de-duplicated so the report does not depend on check order.
//!
//! Rights percentages are informational and are not required to sum to 100.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::CanonicalMetadata;

// ASCII classes only: `\d` would also accept other scripts' digits
static UPC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{12,13}$").expect("valid UPC regex"));
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));
static ISRC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2}-?[A-Za-z0-9]{3}-?[0-9]{2}-?[0-9]{5}$").expect("valid ISRC regex")
});

/// Validation findings for one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Field paths that are required but blank
    pub missing_fields: Vec<String>,
    /// `"<path>: <problem>"` entries for present but malformed values
    pub format_errors: Vec<String>,
}

impl ValidationReport {
    /// No required field is missing
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }

    /// Complete and well-formed
    pub fn is_clean(&self) -> bool {
        self.missing_fields.is_empty() && self.format_errors.is_empty()
    }

    /// Add externally detected missing paths, keeping the report sorted
    pub fn with_missing(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.missing_fields.extend(paths);
        self.finish()
    }

    fn finish(mut self) -> Self {
        self.missing_fields.sort_by(|a, b| natural_cmp(a, b));
        self.missing_fields.dedup();
        self.format_errors.sort_by(|a, b| natural_cmp(a, b));
        self.format_errors.dedup();
        self
    }
}

/// Validation plus the on-chain-only requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReadiness {
    #[serde(flatten)]
    pub report: ValidationReport,
    /// Fields required only for ledger registration
    pub registration_gaps: Vec<String>,
}

impl RegistrationReadiness {
    pub fn is_ready(&self) -> bool {
        self.report.is_clean() && self.registration_gaps.is_empty()
    }
}

/// One independent rule
pub type Check = fn(&CanonicalMetadata, &mut ValidationReport);

/// Rule set applied by [`validate`]
pub const CHECKS: &[Check] = &[
    check_release_fields,
    check_tracks_present,
    check_track_fields,
    check_submitter_fields,
    check_upc_format,
    check_release_date_format,
    check_isrc_format,
    check_positions,
];

/// Runs a list of checks over canonical metadata
#[derive(Debug, Clone)]
pub struct MetadataValidator {
    checks: Vec<Check>,
}

impl Default for MetadataValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataValidator {
    pub fn new() -> Self {
        Self {
            checks: CHECKS.to_vec(),
        }
    }

    /// Validator running exactly `checks`, in the given order
    pub fn with_checks(checks: Vec<Check>) -> Self {
        Self { checks }
    }

    pub fn validate(&self, metadata: &CanonicalMetadata) -> ValidationReport {
        let mut report = ValidationReport::default();
        for check in &self.checks {
            check(metadata, &mut report);
        }
        report.finish()
    }
}

/// Validate with the standard rule set
pub fn validate(metadata: &CanonicalMetadata) -> ValidationReport {
    MetadataValidator::new().validate(metadata)
}

/// Validate and also list the fields needed for on-chain registration
pub fn validate_for_registration(metadata: &CanonicalMetadata) -> RegistrationReadiness {
    let mut registration_gaps = Vec::new();
    if is_blank(&metadata.submitter.wallet_address) {
        registration_gaps.push("submitter.walletAddress".to_string());
    }
    if is_blank(&metadata.submitter.signature) {
        registration_gaps.push("submitter.signature".to_string());
    }

    RegistrationReadiness {
        report: validate(metadata),
        registration_gaps,
    }
}

/// Path of a track field in validator notation
pub fn track_path(index: usize, field: &str) -> String {
    format!("release.tracks[{}].{}", index, field)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn missing(report: &mut ValidationReport, path: impl Into<String>) {
    report.missing_fields.push(path.into());
}

fn check_release_fields(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    let release = &metadata.release;
    if is_blank(&release.title) {
        missing(report, "release.title");
    }
    if release.release_type.is_none() {
        missing(report, "release.type");
    }
    if is_blank(&release.upc) {
        missing(report, "release.upc");
    }
    if is_blank(&release.release_date) {
        missing(report, "release.releaseDate");
    }
}

fn check_tracks_present(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    if metadata.release.tracks.is_empty() {
        missing(report, "release.tracks");
    }
}

fn check_track_fields(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    for (index, track) in metadata.release.tracks.iter().enumerate() {
        if is_blank(&track.title) {
            missing(report, track_path(index, "title"));
        }
        if is_blank(&track.isrc) {
            missing(report, track_path(index, "isrc"));
        }
        if !track.composition.writers.iter().any(|w| !is_blank(&w.name)) {
            missing(report, track_path(index, "composition.writers"));
        }
        if !track.recording.performers.iter().any(|p| !is_blank(&p.name)) {
            missing(report, track_path(index, "recording.performers"));
        }
    }
}

fn check_submitter_fields(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    if is_blank(&metadata.submitter.name) {
        missing(report, "submitter.name");
    }
    if is_blank(&metadata.submitter.role) {
        missing(report, "submitter.role");
    }
}

fn check_upc_format(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    let upc = metadata.release.upc.trim();
    if !upc.is_empty() && !UPC_PATTERN.is_match(upc) {
        report
            .format_errors
            .push("release.upc: invalid UPC (expected 12-13 digits)".to_string());
    }
}

fn check_release_date_format(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    let date = metadata.release.release_date.trim();
    if !date.is_empty() && !DATE_PATTERN.is_match(date) {
        report
            .format_errors
            .push("release.releaseDate: invalid date (expected YYYY-MM-DD)".to_string());
    }
}

fn check_isrc_format(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    for (index, track) in metadata.release.tracks.iter().enumerate() {
        let isrc = track.isrc.trim();
        if !isrc.is_empty() && !ISRC_PATTERN.is_match(isrc) {
            report.format_errors.push(format!(
                "{}: invalid ISRC (expected XX-XXX-YY-NNNNN)",
                track_path(index, "isrc")
            ));
        }
    }
}

fn check_positions(metadata: &CanonicalMetadata, report: &mut ValidationReport) {
    let mut seen: HashMap<u32, usize> = HashMap::new();
    for (index, track) in metadata.release.tracks.iter().enumerate() {
        if track.position == 0 {
            report.format_errors.push(format!(
                "{}: must be a positive integer",
                track_path(index, "position")
            ));
            continue;
        }
        if let Some(first) = seen.get(&track.position) {
            report.format_errors.push(format!(
                "{}: duplicate position {} (also used by release.tracks[{}])",
                track_path(index, "position"),
                track.position,
                first
            ));
        } else {
            seen.insert(track.position, index);
        }
    }
}

/// Ordering that compares digit runs numerically (`tracks[2]` before `tracks[10]`)
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut x_run = String::new();
                while let Some(c) = a_chars.peek().copied().filter(char::is_ascii_digit) {
                    x_run.push(c);
                    a_chars.next();
                }
                let mut y_run = String::new();
                while let Some(c) = b_chars.peek().copied().filter(char::is_ascii_digit) {
                    y_run.push(c);
                    b_chars.next();
                }
                let by_len = x_run
                    .trim_start_matches('0')
                    .len()
                    .cmp(&y_run.trim_start_matches('0').len());
                let ordering = by_len.then_with(|| {
                    x_run
                        .trim_start_matches('0')
                        .cmp(y_run.trim_start_matches('0'))
                });
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::canonical::{Performer, ReleaseType, Track, Writer};

    fn complete() -> CanonicalMetadata {
        let mut metadata = CanonicalMetadata::default();
        metadata.release.title = "Midnight".into();
        metadata.release.release_type = Some(ReleaseType::Single);
        metadata.release.upc = "123456789012".into();
        metadata.release.release_date = "2024-08-15".into();

        let mut track = Track::skeleton(1);
        track.title = "T1".into();
        track.isrc = "US-ABC-23-00001".into();
        track.composition.writers.push(Writer::named("Ann"));
        track.recording.performers.push(Performer::named("Nina"));
        metadata.release.tracks.push(track);

        metadata.submitter.name = "Jo".into();
        metadata.submitter.role = "Artist".into();
        metadata
    }

    #[test]
    fn test_complete_record_is_clean() {
        let report = validate(&complete());
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn test_empty_record_lists_everything() {
        let report = validate(&CanonicalMetadata::default());
        assert_eq!(
            report.missing_fields,
            vec![
                "release.releaseDate",
                "release.title",
                "release.tracks",
                "release.type",
                "release.upc",
                "submitter.name",
                "submitter.role",
            ]
        );
        assert!(report.format_errors.is_empty());
    }

    #[test]
    fn test_nameless_parties_do_not_count() {
        let mut metadata = complete();
        metadata.release.tracks[0].composition.writers = vec![Writer::named("  ")];
        metadata.release.tracks[0].recording.performers.clear();

        let report = validate(&metadata);
        assert_eq!(
            report.missing_fields,
            vec![
                "release.tracks[0].composition.writers",
                "release.tracks[0].recording.performers",
            ]
        );
    }

    #[test]
    fn test_format_errors() {
        let mut metadata = complete();
        metadata.release.upc = "12345".into();
        metadata.release.release_date = "15/08/2024".into();
        metadata.release.tracks[0].isrc = "us-abc-23-00001".into();

        let report = validate(&metadata);
        assert!(report.is_complete());
        assert_eq!(report.format_errors.len(), 3);
        assert!(report.format_errors.iter().any(|e| e.starts_with("release.upc")));
        assert!(report.format_errors.iter().any(|e| e.starts_with("release.releaseDate")));
        assert!(report
            .format_errors
            .iter()
            .any(|e| e.starts_with("release.tracks[0].isrc")));
    }

    #[test]
    fn test_unhyphenated_isrc_accepted() {
        let mut metadata = complete();
        metadata.release.tracks[0].isrc = "USABC2300001".into();
        assert!(validate(&metadata).is_clean());
    }

    #[test]
    fn test_isrc_with_non_ascii_characters_rejected() {
        let mut metadata = complete();
        metadata.release.tracks[0].isrc = "US-ÄBC-23-00001".into();
        assert!(!validate(&metadata).is_clean());

        metadata.release.tracks[0].isrc = "US-ABC-٢٣-00001".into();
        assert!(!validate(&metadata).is_clean());
    }

    #[test]
    fn test_duplicate_and_zero_positions() {
        let mut metadata = complete();
        let mut second = metadata.release.tracks[0].clone();
        second.position = 1;
        let mut third = metadata.release.tracks[0].clone();
        third.position = 0;
        metadata.release.tracks.push(second);
        metadata.release.tracks.push(third);

        let report = validate(&metadata);
        assert_eq!(report.format_errors.len(), 2);
        assert!(report.format_errors[0].starts_with("release.tracks[1].position: duplicate"));
        assert!(report.format_errors[1].starts_with("release.tracks[2].position: must be"));
    }

    #[test]
    fn test_check_order_does_not_matter() {
        let mut metadata = complete();
        metadata.release.upc = "bad".into();
        metadata.release.title.clear();
        metadata.submitter.role.clear();
        metadata.release.tracks[0].isrc.clear();

        let forward = MetadataValidator::new().validate(&metadata);
        let mut reversed: Vec<Check> = CHECKS.to_vec();
        reversed.reverse();
        let backward = MetadataValidator::with_checks(reversed).validate(&metadata);
        let mut rotated: Vec<Check> = CHECKS.to_vec();
        rotated.rotate_left(3);
        let rotated = MetadataValidator::with_checks(rotated).validate(&metadata);

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
    }

    #[test]
    fn test_registration_gaps_are_separate() {
        let readiness = validate_for_registration(&complete());
        assert!(readiness.report.is_clean());
        assert_eq!(
            readiness.registration_gaps,
            vec!["submitter.walletAddress", "submitter.signature"]
        );
        assert!(!readiness.is_ready());
    }

    #[test]
    fn test_natural_ordering_of_track_indices() {
        let mut paths = vec!["release.tracks[10].isrc", "release.tracks[2].isrc", "release.title"];
        paths.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            paths,
            vec!["release.title", "release.tracks[2].isrc", "release.tracks[10].isrc"]
        );
    }
}
