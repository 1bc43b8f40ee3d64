//! Core data model for album reconciliation.
//!
//! Everything here is produced by the catalog lookup or loaded from disk
//! once, then treated as immutable for the rest of the run.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Metadata
// ============================================================================

/// One track position within a disc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub pos: u32,
}

/// Ordered track list of a single disc.
pub type Disc = Vec<Track>;

/// Cover-art size tag as reported by the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Large,
}

/// Authoritative album record fetched from the remote catalog.
///
/// `discs` is ordered because disc number is significant; tracks within a
/// disc are ordered by position. Serializable because the API cache persists
/// whole records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumMetadata {
    pub artist: String,
    pub album: String,
    pub discs: Vec<Disc>,
    pub images: FxHashMap<ImageSize, String>,
}

impl AlbumMetadata {
    /// Multi-disc albums get a `[CDn]` prefix on track filenames.
    pub fn multi_disc(&self) -> bool {
        self.discs.len() > 1
    }
}

// ============================================================================
// Run State
// ============================================================================

/// Durable per-album processing state, keyed by
/// `"{artist} - [{year}] - {album}"` in the status store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumStatus {
    Finished,
    Skipped,
    Error,
}

/// Artists and albums excluded from processing, loaded once at startup.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IgnoreList {
    #[serde(default)]
    pub artists: FxHashSet<String>,
    #[serde(default)]
    pub albums: FxHashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&AlbumStatus::Finished).unwrap(),
            "\"finished\""
        );
        let back: AlbumStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(back, AlbumStatus::Error);
    }

    #[test]
    fn ignore_list_fields_default_to_empty() {
        let ignore: IgnoreList = serde_json::from_str("{\"artists\": [\"Foo\"]}").unwrap();
        assert!(ignore.artists.contains("Foo"));
        assert!(ignore.albums.is_empty());
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let mut images = FxHashMap::default();
        images.insert(ImageSize::Large, "http://img/large.jpg".to_string());
        let metadata = AlbumMetadata {
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            discs: vec![vec![Track {
                name: "Song".to_string(),
                pos: 1,
            }]],
            images,
        };
        let json = serde_json::to_string(&metadata).unwrap();
        let back: AlbumMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
