//! Submission fixtures
//!
//! Raw JSON bodies as clients send them, in the shapes the normalizer knows.

use serde_json::{json, Value};

pub const WALLET: &str = "0x9f8e7d6c5b4a39281706f5e4d3c2b1a098765432";

/// Fully populated canonical submission that validates clean
pub fn complete_release() -> Value {
    json!({
        "release": {
            "title": "Harbor Lights",
            "type": "album",
            "upc": "123456789012",
            "catalogNumber": "HL-001",
            "releaseDate": "2024-08-15",
            "label": {"name": "Tidewater Records", "id": "TWR"},
            "genre": ["Folk", "Americana"],
            "territories": ["WORLDWIDE"],
            "distributionPlatforms": ["Spotify"],
            "tracks": [
                {
                    "position": 1,
                    "title": "Lantern",
                    "duration": "3:41",
                    "isrc": "US-ABC-23-00001",
                    "explicit": false,
                    "language": "en",
                    "composition": {
                        "title": "Lantern",
                        "iswc": "T-123.456.789-0",
                        "writers": [
                            {"name": "Mara Quinn", "ipi": "00012345678", "role": "Composer", "split": 100, "pro": "ASCAP"}
                        ]
                    },
                    "recording": {
                        "performers": [
                            {"name": "Mara Quinn", "role": "MainArtist", "split": 100}
                        ],
                        "producers": [
                            {"name": "Eli Park", "role": "Producer", "split": 5}
                        ],
                        "masterOwner": {"name": "Tidewater Records", "percentage": 95}
                    }
                }
            ]
        },
        "submitter": {
            "name": "Mara Quinn",
            "role": "Artist",
            "walletAddress": WALLET,
            "email": "mara@example.com",
            "timestamp": "2024-08-01T12:00:00Z",
            "signature": "0xsigned"
        }
    })
}

/// Same release in the alternate container layout
pub fn variant_release() -> Value {
    json!({
        "albumInfo": {
            "name": "Harbor Lights",
            "type": "EP",
            "upc": "1234-5678-9012",
            "releaseDate": "2024-08-15",
            "artist": "Mara Quinn",
            "genres": ["Folk"]
        },
        "songs": [
            {"title": "Lantern", "isrc": "usabc2300001", "writers": ["Mara Quinn"]},
            {"title": "Undertow", "isrc": "USABC2300002", "composer": "Eli Park"}
        ],
        "submitterInfo": {
            "name": "Mara Quinn",
            "role": "Artist",
            "walletAddress": WALLET
        }
    })
}

/// Flat record with no recognizable containers
pub fn flat_record() -> Value {
    json!({
        "title": "Midnight",
        "tracks": [{"title": "T1", "isrc": "USABC1234567"}],
        "submitter": {"name": "Jo"}
    })
}
