//! Alias table: canonical field → ordered candidate paths
//!
//! Release- and submitter-level paths are relative to the submission root.
//! Track-level paths are relative to one element of the located track list.
//! Earlier entries win when several are present.

// Containers

pub const RELEASE_CONTAINERS: &[&str] = &["album", "albumInfo", "collection"];
pub const TRACK_LIST_CONTAINERS: &[&str] = &["songs", "tracks"];
pub const SUBMITTER_CONTAINERS: &[&str] =
    &["submitterInfo", "uploader", "creator", "user", "submitter"];

pub const TRACK_LISTS: &[&str] = &[
    "songs",
    "tracks",
    "albumInfo.songs",
    "albumInfo.tracks",
    "release.tracks",
    "album.tracks",
    "album.songs",
    "collection.tracks",
    "collection.songs",
];

// Release

pub const RELEASE_TITLE: &[&str] = &[
    "release.title",
    "albumInfo.name",
    "albumInfo.title",
    "album.title",
    "album.name",
    "albumName",
    "albumTitle",
    "title",
    "name",
    "collection.name",
    "collection.title",
    "album",
];

pub const RELEASE_TYPE: &[&str] = &[
    "release.type",
    "albumInfo.type",
    "album.type",
    "collection.type",
    "releaseType",
    "albumType",
    "type",
    "format",
];

pub const RELEASE_UPC: &[&str] = &[
    "release.upc",
    "albumInfo.upc",
    "album.upc",
    "collection.upc",
    "upc",
    "ean",
    "barcode",
    "albumInfo.ean",
    "album.barcode",
];

pub const RELEASE_CATALOG_NUMBER: &[&str] = &[
    "release.catalogNumber",
    "albumInfo.catalogNumber",
    "album.catalogNumber",
    "collection.catalogNumber",
    "catalogNumber",
    "catalogNo",
    "catalog",
];

pub const RELEASE_DATE: &[&str] = &[
    "release.releaseDate",
    "albumInfo.releaseDate",
    "album.releaseDate",
    "collection.releaseDate",
    "releaseDate",
    "release_date",
    "albumInfo.date",
    "album.date",
    "date",
];

pub const LABEL_NAME: &[&str] = &[
    "release.label.name",
    "albumInfo.label.name",
    "album.label.name",
    "albumInfo.label",
    "album.label",
    "label.name",
    "label",
    "recordLabel",
];

pub const LABEL_ID: &[&str] = &[
    "release.label.id",
    "albumInfo.label.id",
    "album.label.id",
    "label.id",
    "labelId",
];

pub const GENRES: &[&str] = &[
    "release.genre",
    "albumInfo.genre",
    "albumInfo.genres",
    "album.genre",
    "album.genres",
    "collection.genre",
    "genre",
    "genres",
];

pub const TERRITORIES: &[&str] = &[
    "release.territories",
    "albumInfo.territories",
    "album.territories",
    "territories",
];

pub const DISTRIBUTION_PLATFORMS: &[&str] = &[
    "release.distributionPlatforms",
    "albumInfo.distributionPlatforms",
    "album.distributionPlatforms",
    "distributionPlatforms",
    "platforms",
];

/// Release-level artist, last fallback for track performers
pub const RELEASE_ARTIST: &[&str] = &[
    "release.artist",
    "albumInfo.artist",
    "albumInfo.artists",
    "album.artist",
    "album.artists",
    "collection.artist",
    "artist",
    "artists",
    "albumArtist",
];

// Submitter

pub const SUBMITTER_NAME: &[&str] = &[
    "submitter.name",
    "submitterInfo.name",
    "uploader.name",
    "creator.name",
    "user.name",
    "submitterInfo.fullName",
    "user.fullName",
    "user.username",
    "uploader.username",
    "submitterName",
    "submitter",
    "uploader",
    "creator",
    "user",
];

pub const SUBMITTER_ROLE: &[&str] = &[
    "submitter.role",
    "submitterInfo.role",
    "uploader.role",
    "creator.role",
    "user.role",
    "submitterRole",
];

pub const SUBMITTER_WALLET: &[&str] = &[
    "submitter.walletAddress",
    "submitterInfo.walletAddress",
    "uploader.walletAddress",
    "creator.walletAddress",
    "user.walletAddress",
    "submitter.wallet",
    "submitterInfo.wallet",
    "user.wallet",
    "walletAddress",
    "wallet",
];

pub const SUBMITTER_EMAIL: &[&str] = &[
    "submitter.email",
    "submitterInfo.email",
    "uploader.email",
    "creator.email",
    "user.email",
    "email",
];

pub const SUBMITTER_TIMESTAMP: &[&str] = &[
    "submitter.timestamp",
    "submitterInfo.timestamp",
    "uploader.timestamp",
    "creator.timestamp",
    "user.timestamp",
    "submittedAt",
    "timestamp",
];

pub const SUBMITTER_SIGNATURE: &[&str] = &[
    "submitter.signature",
    "submitterInfo.signature",
    "uploader.signature",
    "creator.signature",
    "user.signature",
    "signature",
];

// Track (relative to one track element)

pub const TRACK_TITLE: &[&str] = &["title", "name", "trackTitle", "songTitle"];
pub const TRACK_POSITION: &[&str] = &["position", "trackNumber", "number", "track"];
pub const TRACK_DURATION: &[&str] = &["duration", "length", "time"];
pub const TRACK_ISRC: &[&str] = &["isrc", "ISRC", "recording.isrc", "ids.isrc"];
pub const TRACK_EXPLICIT: &[&str] = &["explicit", "isExplicit", "parentalAdvisory"];
pub const TRACK_LANGUAGE: &[&str] = &["language", "lang"];
pub const TRACK_LEDGER_METADATA: &[&str] = &["storyProtocolMetadata"];

pub const COMPOSITION_TITLE: &[&str] = &["composition.title", "workTitle"];
pub const COMPOSITION_ISWC: &[&str] = &["composition.iswc", "iswc", "ISWC"];
pub const COMPOSITION_RIGHTS: &[&str] = &["composition.rights"];

pub const WRITERS: &[&str] = &[
    "composition.writers",
    "writers",
    "songwriters",
    "composers",
    "writer",
    "composer",
];

/// Explicit performer lists
pub const PERFORMERS: &[&str] = &["recording.performers", "performers"];

/// Track-level artist fields used when no explicit performer list exists
pub const TRACK_ARTIST: &[&str] = &["artist", "artists", "performer", "mainArtist"];

pub const PRODUCERS: &[&str] = &["recording.producers", "producers", "producer"];

pub const MASTER_OWNER_NAME: &[&str] = &["recording.masterOwner.name", "masterOwner.name", "masterOwner"];
pub const MASTER_OWNER_SHARE: &[&str] = &[
    "recording.masterOwner.percentage",
    "masterOwner.percentage",
];
pub const RECORDING_RIGHTS: &[&str] = &["recording.rights"];

// Party entries (relative to one writer/performer/producer object)

pub const PARTY_NAME: &[&str] = &["name", "fullName", "artist"];
pub const PARTY_ROLE: &[&str] = &["role", "type"];
pub const PARTY_SPLIT: &[&str] = &["split", "share", "percentage"];
pub const PARTY_IPI: &[&str] = &["ipi", "IPI"];
pub const PARTY_ISNI: &[&str] = &["isni", "ISNI"];
pub const PARTY_PRO: &[&str] = &["pro", "PRO", "society"];
