//! Registration document builders
//!
//! Derives the two documents that get stored before registration:
//! - the **IP document**, describing the rights (title, creators, full release)
//! - the **display document**, a name/description/attributes record for wallets
//!   and marketplaces, carrying the complete canonical metadata as well
//!
//! plus the **integration plan**, which is kept on the submission rather than
//! stored: the asset relationships, license templates, royalty distributions
//! and attestations the ledger's modules are configured from.
//!
//! All builders are pure: the same metadata and clock always yield the same
//! JSON, so content hashes are reproducible.

use crate::models::CanonicalMetadata;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Attester named on the metadata verification attestation
pub const METADATA_ATTESTER: &str = "DerivePlatform";

/// Placeholder id segment for a work or recording without an identifier yet
const PENDING: &str = "PENDING";

/// Everything enrichment derives for one submission
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDocuments {
    pub ip: Value,
    pub display: Value,
    pub integration: Value,
}

impl RegistrationDocuments {
    pub fn build(metadata: &CanonicalMetadata, now: DateTime<Utc>) -> Self {
        Self {
            ip: build_ip_document(metadata),
            display: build_display_document(metadata, now),
            integration: build_integration_document(metadata, now),
        }
    }
}

fn release_type_label(metadata: &CanonicalMetadata) -> &'static str {
    metadata
        .release
        .release_type
        .map(|t| t.as_str())
        .unwrap_or_default()
}

fn joined_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// IP document: rights description with the submitter as sole creator
pub fn build_ip_document(metadata: &CanonicalMetadata) -> Value {
    let release = &metadata.release;
    let submitter = &metadata.submitter;
    let release_type = release_type_label(metadata);

    json!({
        "title": release.title,
        "description": format!(
            "Music release: {} ({}). Released on {}. UPC: {}",
            release.title, release_type, release.release_date, release.upc
        ),
        "creators": [{
            "name": submitter.name,
            "address": submitter.wallet_address,
            "description": submitter.role,
            "contributionPercent": 100,
            "socialMedia": [],
        }],
        "mediaUrl": "",
        "mediaType": "music",
        "release": {
            "title": release.title,
            "type": release_type,
            "upc": release.upc,
            "catalogNumber": release.catalog_number,
            "releaseDate": release.release_date,
            "label": release.label,
            "genre": release.genre,
            "territories": release.territories,
            "distributionPlatforms": release.distribution_platforms,
        },
        "tracks": release.tracks,
        "submitter": {
            "name": submitter.name,
            "role": submitter.role,
            "walletAddress": submitter.wallet_address,
            "email": submitter.email,
            "timestamp": submitter.timestamp,
        },
    })
}

fn attribute(trait_type: &str, value: Value) -> Value {
    json!({ "trait_type": trait_type, "value": value })
}

/// Display document: name, description, attribute list and the full metadata
///
/// `now` stands in for the submission date when the submitter gave none.
pub fn build_display_document(metadata: &CanonicalMetadata, now: DateTime<Utc>) -> Value {
    let release = &metadata.release;
    let submitter = &metadata.submitter;
    let release_type = release_type_label(metadata);
    let submitted_at = if submitter.timestamp.trim().is_empty() {
        now.to_rfc3339()
    } else {
        submitter.timestamp.clone()
    };

    let attributes = vec![
        attribute("Release Type", json!(release_type)),
        attribute("Release Date", json!(release.release_date)),
        attribute("UPC", json!(release.upc)),
        attribute("Catalog Number", json!(release.catalog_number)),
        attribute("Number of Tracks", json!(release.tracks.len())),
        attribute("Label", json!(non_blank_or(&release.label.name, "Independent"))),
        attribute("Label ID", json!(non_blank_or(&release.label.id, "N/A"))),
        attribute("Genre", json!(joined_or(&release.genre, "Unknown"))),
        attribute("Territories", json!(joined_or(&release.territories, "WORLDWIDE"))),
        attribute(
            "Distribution Platforms",
            json!(joined_or(&release.distribution_platforms, "N/A")),
        ),
        attribute("Submitter", json!(submitter.name)),
        attribute("Submitter Role", json!(submitter.role)),
        attribute("Submission Date", json!(submitted_at)),
    ];

    json!({
        "name": format!("{} - {}", release.title, release_type),
        "description": format!(
            "Music release: {}. UPC: {}. Contains {} tracks.",
            release.title,
            release.upc,
            release.tracks.len()
        ),
        "attributes": attributes,
        "completeMetadata": metadata,
        "tracks": release.tracks,
    })
}

fn id_or_pending(value: &str) -> &str {
    non_blank_or(value.trim(), PENDING)
}

/// Integration plan: per-track relationships, licenses and royalty splits
///
/// Tracks without an ISWC or ISRC get `PENDING` ids. `now` dates the
/// metadata verification attestation.
pub fn build_integration_document(metadata: &CanonicalMetadata, now: DateTime<Utc>) -> Value {
    let tracks = &metadata.release.tracks;
    let submitter = &metadata.submitter;

    let relationships: Vec<Value> = tracks
        .iter()
        .map(|track| {
            json!({
                "composition": {
                    "id": format!("COMP-{}", id_or_pending(&track.composition.iswc)),
                    "type": "MUSICAL_COMPOSITION",
                },
                "recording": {
                    "id": format!("REC-{}", id_or_pending(&track.isrc)),
                    "type": "SOUND_RECORDING",
                },
            })
        })
        .collect();

    let templates: Vec<Value> = tracks
        .iter()
        .map(|track| {
            let rights = &track.recording.rights;
            json!({
                "trackId": id_or_pending(&track.isrc),
                "licenseTemplates": [
                    { "name": "STANDARD_STREAMING", "terms": rights.performance_royalties },
                    { "name": "SAMPLING_LICENSE", "terms": rights.master_license_terms },
                ],
            })
        })
        .collect();

    let distributions: Vec<Value> = tracks
        .iter()
        .map(|track| {
            json!({
                "trackId": id_or_pending(&track.isrc),
                "compositionRoyalties": track.composition.rights.public_performing_rights.holders,
                "recordingRoyalties": track.recording.rights.neighbouring_rights.holders,
            })
        })
        .collect();

    json!({
        "ipCoreRegistration": {
            "assetType": "MUSIC",
            "relationships": relationships,
        },
        "licensingModule": { "templates": templates },
        "royaltyModule": { "distributions": distributions },
        "attestations": {
            "metadata": {
                "attester": METADATA_ATTESTER,
                "timestamp": now.to_rfc3339(),
                "type": "METADATA_VERIFICATION",
            },
            "ownership": {
                "attester": submitter.name,
                "timestamp": submitter.timestamp,
                "signature": submitter.signature,
                "walletAddress": submitter.wallet_address,
            },
        },
    })
}
