//! Canonical music-rights metadata schema
//!
//! Every accepted submission is normalized into [`CanonicalMetadata`] before
//! validation. Wire names are camelCase and match the documents clients
//! already send (`release.type`, `release.genre`, `submitter.walletAddress`).
//!
//! All structs deserialize leniently: absent fields take their defaults so a
//! partial record can be held and reported on instead of rejected at parse time.

use serde::{Deserialize, Deserializer, Serialize};

/// Root record: one release plus the party submitting it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanonicalMetadata {
    pub release: Release,
    pub submitter: Submitter,
}

/// Release type
///
/// Unrecognized labels map to `Album` (see [`ReleaseType::from_label`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseType {
    #[serde(rename = "album")]
    Album,
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "EP")]
    Ep,
}

impl ReleaseType {
    /// Case-insensitive mapping of free-form release type labels
    ///
    /// Returns `None` for a blank label. Anything non-blank that is not a
    /// known single/EP spelling is treated as an album.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        if label.is_empty() {
            return None;
        }
        Some(match label.as_str() {
            "single" => ReleaseType::Single,
            "ep" | "e.p." | "e.p" => ReleaseType::Ep,
            _ => ReleaseType::Album,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Album => "album",
            ReleaseType::Single => "single",
            ReleaseType::Ep => "EP",
        }
    }
}

impl Default for ReleaseType {
    fn default() -> Self {
        ReleaseType::Album
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn de_release_type<'de, D>(deserializer: D) -> Result<Option<ReleaseType>, D::Error>
where
    D: Deserializer<'de>,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(ReleaseType::from_label))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Release {
    pub title: String,
    /// `None` when the submission never named a type
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_release_type"
    )]
    pub release_type: Option<ReleaseType>,
    pub upc: String,
    pub catalog_number: String,
    /// ISO-8601 date (`YYYY-MM-DD`)
    pub release_date: String,
    pub label: Label,
    /// Ordered set of genres
    pub genre: Vec<String>,
    /// Ordered set, `["WORLDWIDE"]` unless restricted
    pub territories: Vec<String>,
    pub distribution_platforms: Vec<String>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Label {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Track {
    /// 1-based, unique within the release
    pub position: u32,
    pub title: String,
    pub duration: String,
    pub isrc: String,
    pub explicit: bool,
    pub language: String,
    pub composition: Composition,
    pub recording: Recording,
    /// Ledger-side registration hints, carried through untouched
    #[serde(
        rename = "storyProtocolMetadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub ledger_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Composition {
    pub title: String,
    pub iswc: String,
    pub writers: Vec<Writer>,
    pub rights: CompositionRights,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Writer {
    pub name: String,
    pub ipi: String,
    pub role: String,
    pub split: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    pub pro: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Publisher {
    pub name: String,
    pub ipi: String,
    pub split: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositionRights {
    pub moral_rights: MoralRights,
    pub public_performing_rights: PublicPerformingRights,
    pub mechanical_rights: MechanicalRights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoralRights {
    pub attribution: bool,
    pub integrity: bool,
    pub disclosure: bool,
    pub withdrawal: bool,
}

impl Default for MoralRights {
    fn default() -> Self {
        Self {
            attribution: true,
            integrity: true,
            disclosure: true,
            withdrawal: false,
        }
    }
}

/// Performing-rights holders; percentages are informational and never summed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicPerformingRights {
    pub holders: Vec<PerformingRightsHolder>,
    pub restrictions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformingRightsHolder {
    pub entity: String,
    pub percentage: f64,
    pub collecting_organization: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MechanicalRights {
    pub holders: Vec<MechanicalRightsHolder>,
    pub statutory_rate: bool,
    pub custom_rate: Option<String>,
}

impl Default for MechanicalRights {
    fn default() -> Self {
        Self {
            holders: Vec::new(),
            statutory_rate: true,
            custom_rate: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MechanicalRightsHolder {
    pub entity: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recording {
    pub performers: Vec<Performer>,
    pub producers: Vec<Producer>,
    pub master_owner: MasterOwner,
    pub rights: RecordingRights,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Performer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isni: Option<String>,
    pub role: String,
    pub split: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Producer {
    pub name: String,
    pub role: String,
    pub split: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MasterOwner {
    pub name: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingRights {
    pub neighbouring_rights: NeighbouringRights,
    pub master_license_terms: MasterLicenseTerms,
    pub performance_royalties: PerformanceRoyalties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeighbouringRights {
    pub holders: Vec<NeighbouringRightsHolder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeighbouringRightsHolder {
    pub entity: String,
    pub role: String,
    pub percentage: f64,
    pub collecting_organization: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MasterLicenseTerms {
    pub allow_sampling: bool,
    pub sampling_fee: String,
    pub allow_synchronization: bool,
    pub territorial_restrictions: Vec<String>,
    pub exclusivity: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceRoyalties {
    pub streaming_rate: String,
    pub radio_rate: String,
    pub public_venue_rate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Submitter {
    pub name: String,
    pub role: String,
    pub wallet_address: String,
    pub email: String,
    /// RFC 3339 submission time
    pub timestamp: String,
    pub signature: String,
}

/// Default territory when a submission does not restrict distribution
pub const WORLDWIDE: &str = "WORLDWIDE";

/// Default track language
pub const DEFAULT_LANGUAGE: &str = "en";

pub const ROLE_MAIN_ARTIST: &str = "MainArtist";
pub const ROLE_PRODUCER: &str = "Producer";
pub const ROLE_COMPOSER: &str = "Composer";

/// Conventional master owner share when the submission does not say
pub const DEFAULT_MASTER_SHARE: f64 = 95.0;
/// Conventional producer points when the submission does not say
pub const DEFAULT_PRODUCER_SPLIT: f64 = 5.0;

impl Writer {
    /// Writer known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: ROLE_COMPOSER.to_string(),
            split: 100.0,
            ..Default::default()
        }
    }
}

impl Performer {
    /// Performer known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            isni: None,
            role: ROLE_MAIN_ARTIST.to_string(),
            split: 100.0,
        }
    }
}

impl Producer {
    /// Producer known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: ROLE_PRODUCER.to_string(),
            split: DEFAULT_PRODUCER_SPLIT,
        }
    }
}

impl MasterLicenseTerms {
    /// Customary terms used for fresh records
    pub fn standard() -> Self {
        Self {
            allow_sampling: true,
            sampling_fee: "Negotiable".to_string(),
            allow_synchronization: true,
            territorial_restrictions: Vec::new(),
            exclusivity: false,
        }
    }
}

impl PerformanceRoyalties {
    pub fn standard() -> Self {
        Self {
            streaming_rate: "Standard".to_string(),
            radio_rate: "Standard".to_string(),
            public_venue_rate: "Standard".to_string(),
        }
    }
}

impl Track {
    /// Fresh track with customary rights defaults and no identifying data
    pub fn skeleton(position: u32) -> Self {
        Self {
            position,
            language: DEFAULT_LANGUAGE.to_string(),
            recording: Recording {
                master_owner: MasterOwner {
                    name: String::new(),
                    percentage: DEFAULT_MASTER_SHARE,
                },
                rights: RecordingRights {
                    neighbouring_rights: NeighbouringRights::default(),
                    master_license_terms: MasterLicenseTerms::standard(),
                    performance_royalties: PerformanceRoyalties::standard(),
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Blank track for a fill-in template: one empty writer, performer and producer
    fn template(position: u32) -> Self {
        let mut track = Self::skeleton(position);

        let mut writer = Writer::named("");
        writer.publisher = Some(Publisher {
            split: 50.0,
            ..Default::default()
        });
        track.composition.writers.push(writer);
        track.composition.rights.public_performing_rights.holders = vec![
            PerformingRightsHolder {
                percentage: 50.0,
                ..Default::default()
            },
            PerformingRightsHolder {
                percentage: 50.0,
                ..Default::default()
            },
        ];
        track.composition.rights.mechanical_rights.holders = vec![
            MechanicalRightsHolder {
                entity: String::new(),
                percentage: 50.0,
            },
            MechanicalRightsHolder {
                entity: String::new(),
                percentage: 50.0,
            },
        ];

        let mut performer = Performer::named("");
        performer.isni = Some(String::new());
        track.recording.performers.push(performer);
        track.recording.producers.push(Producer::named(""));
        track.recording.rights.neighbouring_rights.holders = [
            (ROLE_MAIN_ARTIST, 45.0),
            ("MasterOwner", 50.0),
            (ROLE_PRODUCER, 5.0),
        ]
        .into_iter()
        .map(|(role, percentage)| NeighbouringRightsHolder {
            role: role.to_string(),
            percentage,
            ..Default::default()
        })
        .collect();

        track
    }
}

impl CanonicalMetadata {
    /// Empty fill-in template with `track_count` tracks (at least one)
    ///
    /// Identifying fields are blank, so the template validates as incomplete
    /// until a submitter fills it in.
    pub fn template(release_type: ReleaseType, track_count: u32) -> Self {
        let now = chrono::Utc::now();
        let tracks = (1..=track_count.max(1)).map(Track::template).collect();

        Self {
            release: Release {
                release_type: Some(release_type),
                release_date: now.date_naive().format("%Y-%m-%d").to_string(),
                territories: vec![WORLDWIDE.to_string()],
                tracks,
                ..Default::default()
            },
            submitter: Submitter {
                timestamp: now.to_rfc3339(),
                ..Default::default()
            },
        }
    }

    /// Track lookup by position
    pub fn track(&self, position: u32) -> Option<&Track> {
        self.release.tracks.iter().find(|t| t.position == position)
    }

    /// Names of all main performers across the release, first occurrence order
    pub fn creator_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for track in &self.release.tracks {
            for performer in &track.recording.performers {
                let name = performer.name.trim();
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_release_type_labels() {
        assert_eq!(ReleaseType::from_label("Single"), Some(ReleaseType::Single));
        assert_eq!(ReleaseType::from_label(" ep "), Some(ReleaseType::Ep));
        assert_eq!(ReleaseType::from_label("E.P."), Some(ReleaseType::Ep));
        assert_eq!(ReleaseType::from_label("LP"), Some(ReleaseType::Album));
        assert_eq!(ReleaseType::from_label("mixtape"), Some(ReleaseType::Album));
        assert_eq!(ReleaseType::from_label("   "), None);
    }

    #[test]
    fn test_release_type_wire_names() {
        assert_eq!(serde_json::to_value(ReleaseType::Ep).unwrap(), json!("EP"));
        assert_eq!(serde_json::to_value(ReleaseType::Album).unwrap(), json!("album"));
    }

    #[test]
    fn test_partial_record_parses_with_defaults() {
        let metadata: CanonicalMetadata = serde_json::from_value(json!({
            "release": {"title": "Midnight", "type": "Single"},
            "submitter": {"name": "Jo"}
        }))
        .unwrap();

        assert_eq!(metadata.release.title, "Midnight");
        assert_eq!(metadata.release.release_type, Some(ReleaseType::Single));
        assert!(metadata.release.tracks.is_empty());
        assert_eq!(metadata.submitter.name, "Jo");
        assert!(metadata.submitter.role.is_empty());
    }

    #[test]
    fn test_blank_type_is_none() {
        let metadata: CanonicalMetadata =
            serde_json::from_value(json!({"release": {"type": ""}, "submitter": {}})).unwrap();
        assert_eq!(metadata.release.release_type, None);

        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value["release"].get("type").is_none());
    }

    #[test]
    fn test_rights_defaults() {
        let rights = CompositionRights::default();
        assert!(rights.moral_rights.attribution);
        assert!(!rights.moral_rights.withdrawal);
        assert!(rights.mechanical_rights.statutory_rate);
    }

    #[test]
    fn test_template_shape() {
        let template = CanonicalMetadata::template(ReleaseType::Ep, 3);
        assert_eq!(template.release.tracks.len(), 3);
        assert_eq!(template.release.tracks[2].position, 3);
        assert_eq!(template.release.territories, vec![WORLDWIDE]);
        assert_eq!(template.release.release_date.len(), 10);

        let track = &template.release.tracks[0];
        assert_eq!(track.composition.writers[0].role, ROLE_COMPOSER);
        assert_eq!(track.recording.performers[0].role, ROLE_MAIN_ARTIST);
        assert_eq!(track.recording.producers[0].split, DEFAULT_PRODUCER_SPLIT);
        assert_eq!(track.recording.master_owner.percentage, DEFAULT_MASTER_SHARE);
        assert_eq!(track.recording.rights.neighbouring_rights.holders.len(), 3);
    }

    #[test]
    fn test_template_has_at_least_one_track() {
        let template = CanonicalMetadata::template(ReleaseType::Single, 0);
        assert_eq!(template.release.tracks.len(), 1);
    }

    #[test]
    fn test_creator_names_dedupe() {
        let mut metadata = CanonicalMetadata::default();
        let mut t1 = Track::skeleton(1);
        t1.recording.performers.push(Performer::named("Ada"));
        let mut t2 = Track::skeleton(2);
        t2.recording.performers.push(Performer::named("Ada"));
        t2.recording.performers.push(Performer::named("Bo"));
        metadata.release.tracks = vec![t1, t2];

        assert_eq!(metadata.creator_names(), vec!["Ada", "Bo"]);
    }
}
