//! Validator Integration Tests

mod helpers;

use helpers::{complete_release, flat_record, variant_release};
use rights_ingest::models::CanonicalMetadata;
use rights_ingest::normalize::normalize;
use rights_ingest::validators::{validate, validate_for_registration, MetadataValidator, CHECKS};
use serde_json::json;

fn parse(raw: serde_json::Value) -> CanonicalMetadata {
    normalize(&raw).metadata
}

#[test]
fn test_complete_release_is_clean() {
    let report = validate(&parse(complete_release()));
    assert!(report.missing_fields.is_empty(), "{:?}", report.missing_fields);
    assert!(report.format_errors.is_empty(), "{:?}", report.format_errors);
    assert!(report.is_clean());
}

#[test]
fn test_flat_record_reports_exact_gaps() {
    let report = validate(&parse(flat_record()));
    assert_eq!(
        report.missing_fields,
        vec![
            "release.releaseDate",
            "release.tracks[0].composition.writers",
            "release.tracks[0].recording.performers",
            "release.type",
            "release.upc",
            "submitter.role",
        ]
    );
    assert!(report.format_errors.is_empty());
}

#[test]
fn test_check_order_does_not_change_report() {
    let mut raw = flat_record();
    raw["upc"] = json!("12AB");
    raw["tracks"]
        .as_array_mut()
        .unwrap()
        .push(json!({"title": "T2", "isrc": "bad"}));
    let metadata = parse(raw);

    let forward = MetadataValidator::new().validate(&metadata);
    let mut reversed_checks = CHECKS.to_vec();
    reversed_checks.reverse();
    let reversed = MetadataValidator::with_checks(reversed_checks).validate(&metadata);

    assert_eq!(forward, reversed);
    assert!(!forward.format_errors.is_empty());
}

#[test]
fn test_format_errors_reported_for_present_values() {
    let mut raw = complete_release();
    raw["release"]["upc"] = json!("12345");
    raw["release"]["releaseDate"] = json!("15/08/2024");
    raw["release"]["tracks"][0]["isrc"] = json!("NOT-AN-ISRC");
    let report = validate(&parse(raw));

    assert!(report.missing_fields.is_empty());
    assert_eq!(report.format_errors.len(), 3, "{:?}", report.format_errors);
    assert!(report.format_errors.iter().any(|e| e.starts_with("release.upc")));
    assert!(report.format_errors.iter().any(|e| e.starts_with("release.releaseDate")));
    assert!(report
        .format_errors
        .iter()
        .any(|e| e.starts_with("release.tracks[0].isrc")));
}

#[test]
fn test_non_ascii_digits_are_format_errors() {
    let mut raw = complete_release();
    raw["release"]["upc"] = json!("١٢٣٤٥٦٧٨٩٠١٢");
    raw["release"]["releaseDate"] = json!("٢٠٢٤-٠٨-١٥");
    let report = validate(&parse(raw));

    assert!(!report.is_clean());
    assert!(report.format_errors.iter().any(|e| e.starts_with("release.upc")));
    assert!(report.format_errors.iter().any(|e| e.starts_with("release.releaseDate")));
}

#[test]
fn test_duplicate_positions_are_format_errors() {
    let mut raw = complete_release();
    let track = raw["release"]["tracks"][0].clone();
    raw["release"]["tracks"]
        .as_array_mut()
        .unwrap()
        .push(track);
    let report = validate(&parse(raw));

    assert!(report
        .format_errors
        .iter()
        .any(|e| e.contains("duplicate position 1")));
}

#[test]
fn test_splits_are_not_summed() {
    let mut raw = complete_release();
    raw["release"]["tracks"][0]["composition"]["writers"][0]["split"] = json!(40);
    raw["release"]["tracks"][0]["recording"]["performers"][0]["split"] = json!(250);
    assert!(validate(&parse(raw)).is_clean());
}

#[test]
fn test_registration_gaps_are_separate() {
    let readiness = validate_for_registration(&parse(variant_release()));
    assert!(readiness.report.is_clean());
    assert_eq!(readiness.registration_gaps, vec!["submitter.signature"]);
    assert!(!readiness.is_ready());

    let readiness = validate_for_registration(&parse(complete_release()));
    assert!(readiness.is_ready());
}
