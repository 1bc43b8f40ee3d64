//! Fuzzy assignment of existing files to canonical names.
//!
//! Tracks are matched by similarity against the canonical filename derived
//! from the metadata; cover art is matched by exact filename convention.
//! Both matchers consume their candidates: a file is matched at most once,
//! and a matched file is removed from the pool.

use std::path::Path;

use crate::models::{AlbumMetadata, ImageSize};
use crate::normalize::sanitize_filename;
use crate::plan::{DownloadOp, MoveOp};
use crate::scoring::similarity;

/// Canonical large cover filename.
pub const LARGE_ART: &str = "Folder.jpg";
/// Canonical small thumbnail filename.
pub const SMALL_ART: &str = "AlbumArtSmall.jpg";

/// Extension of `name` as found, including the dot; empty when absent.
fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// Canonical base name (no extension) for a track.
fn track_base_name(metadata: &AlbumMetadata, disc_num: usize, pos: u32, name: &str) -> String {
    let prefix = if metadata.multi_disc() {
        format!("[CD{disc_num}] ")
    } else {
        String::new()
    };
    format!("{prefix}{pos:02} {}", sanitize_filename(name))
}

/// Assign existing music files to canonical track names.
///
/// Discs and tracks are visited in order; each track takes the
/// highest-similarity file remaining in the pool, ties resolved
/// lexicographically so the result does not depend on directory enumeration
/// order. Stops early when the pool runs dry; an album with no discs
/// produces no moves.
pub fn match_tracks(files: &mut Vec<String>, metadata: &AlbumMetadata) -> Vec<MoveOp> {
    let mut moves = Vec::new();
    for (disc_idx, disc) in metadata.discs.iter().enumerate() {
        for track in disc {
            if files.is_empty() {
                return moves;
            }
            let target = track_base_name(metadata, disc_idx + 1, track.pos, &track.name);
            let mut best = 0;
            let mut best_score = -1.0;
            for (idx, name) in files.iter().enumerate() {
                let score = similarity(name, &target);
                if score > best_score
                    || (score == best_score && name.as_str() < files[best].as_str())
                {
                    best = idx;
                    best_score = score;
                }
            }
            let src = files.remove(best);
            let dst = format!("{target}{}", file_extension(&src));
            moves.push(MoveOp { src, dst });
        }
    }
    moves
}

/// Case-insensitive basename lookup; removes and returns the first match.
/// `wanted` must already be lowercase.
fn take_by_name(files: &mut Vec<String>, wanted: &str) -> Option<String> {
    let idx = files.iter().position(|path| {
        let base = path.rsplit('/').next().unwrap_or(path);
        base.to_lowercase() == wanted
    })?;
    Some(files.remove(idx))
}

/// Assign existing non-music files to the cover-art conventions, and decide
/// which art assets must be downloaded instead.
///
/// The large cover accepts `folder.jpg` or, failing that,
/// `"{artist} - {album}.jpg"`; the small thumbnail accepts only
/// `albumartsmall.jpg`. All comparisons are case-insensitive on the
/// basename. A role with no match and a non-empty source URI in the
/// metadata becomes a download.
pub fn match_album_art(
    files: &mut Vec<String>,
    metadata: &AlbumMetadata,
) -> (Vec<MoveOp>, Vec<DownloadOp>) {
    let mut moves = Vec::new();
    let mut need_small = true;
    let mut need_large = true;

    let alt_large = format!("{} - {}.jpg", metadata.artist, metadata.album).to_lowercase();
    if let Some(src) = take_by_name(files, "folder.jpg") {
        need_large = false;
        moves.push(MoveOp { src, dst: LARGE_ART.to_string() });
    } else if let Some(src) = take_by_name(files, &alt_large) {
        need_large = false;
        moves.push(MoveOp { src, dst: LARGE_ART.to_string() });
    }
    if let Some(src) = take_by_name(files, "albumartsmall.jpg") {
        need_small = false;
        moves.push(MoveOp { src, dst: SMALL_ART.to_string() });
    }

    let mut downloads = Vec::new();
    if need_small {
        if let Some(uri) = metadata.images.get(&ImageSize::Small).filter(|u| !u.is_empty()) {
            downloads.push(DownloadOp { src: uri.clone(), dst: SMALL_ART.to_string() });
        }
    }
    if need_large {
        if let Some(uri) = metadata.images.get(&ImageSize::Large).filter(|u| !u.is_empty()) {
            downloads.push(DownloadOp { src: uri.clone(), dst: LARGE_ART.to_string() });
        }
    }
    (moves, downloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;
    use rustc_hash::FxHashMap;

    fn album(discs: Vec<Vec<(&str, u32)>>) -> AlbumMetadata {
        AlbumMetadata {
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            discs: discs
                .into_iter()
                .map(|tracks| {
                    tracks
                        .into_iter()
                        .map(|(name, pos)| Track { name: name.to_string(), pos })
                        .collect()
                })
                .collect(),
            images: FxHashMap::default(),
        }
    }

    fn with_images(mut metadata: AlbumMetadata, small: &str, large: &str) -> AlbumMetadata {
        let mut images = FxHashMap::default();
        if !small.is_empty() {
            images.insert(ImageSize::Small, small.to_string());
        }
        if !large.is_empty() {
            images.insert(ImageSize::Large, large.to_string());
        }
        metadata.images = images;
        metadata
    }

    #[test]
    fn correctly_named_files_map_to_themselves() {
        let metadata = album(vec![vec![("Song One", 1), ("Song Two", 2)]]);
        let mut files = vec!["01 Song One.mp3".to_string(), "02 Song Two.mp3".to_string()];
        let moves = match_tracks(&mut files, &metadata);
        assert!(files.is_empty());
        assert_eq!(moves.len(), 2);
        for op in &moves {
            assert_eq!(op.src, op.dst);
        }
    }

    #[test]
    fn misnamed_files_move_to_canonical_names() {
        let metadata = album(vec![vec![("Song One", 1), ("Song Two", 2)]]);
        let mut files = vec!["1-song_one.FLAC".to_string(), "2-song_two.flac".to_string()];
        let moves = match_tracks(&mut files, &metadata);
        assert_eq!(
            moves,
            vec![
                MoveOp { src: "1-song_one.FLAC".to_string(), dst: "01 Song One.FLAC".to_string() },
                MoveOp { src: "2-song_two.flac".to_string(), dst: "02 Song Two.flac".to_string() },
            ]
        );
    }

    #[test]
    fn multi_disc_albums_get_cd_prefixes() {
        let metadata = album(vec![
            vec![("Opener", 1), ("Closer", 2)],
            vec![("Encore", 1)],
        ]);
        let mut files = vec![
            "CD1/01 Opener.mp3".to_string(),
            "CD1/02 Closer.mp3".to_string(),
            "CD2/01 Encore.mp3".to_string(),
        ];
        let moves = match_tracks(&mut files, &metadata);
        let dsts: Vec<_> = moves.iter().map(|op| op.dst.as_str()).collect();
        assert_eq!(
            dsts,
            vec!["[CD1] 01 Opener.mp3", "[CD1] 02 Closer.mp3", "[CD2] 01 Encore.mp3"]
        );
    }

    #[test]
    fn each_file_is_matched_at_most_once() {
        let metadata = album(vec![vec![("Song", 1), ("Song", 2), ("Song", 3)]]);
        let mut files = vec!["a song.mp3".to_string(), "another song.mp3".to_string()];
        let moves = match_tracks(&mut files, &metadata);
        // pool of 2 against 3 tracks: exactly 2 assignments, all distinct
        assert_eq!(moves.len(), 2);
        assert_ne!(moves[0].src, moves[1].src);
        assert!(files.is_empty());
    }

    #[test]
    fn empty_disc_list_yields_no_moves() {
        let metadata = album(Vec::new());
        let mut files = vec!["01 Song.mp3".to_string()];
        assert!(match_tracks(&mut files, &metadata).is_empty());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn similarity_ties_break_lexicographically() {
        // neither file shares a character with the target, so both score 0
        let metadata = album(vec![vec![("01 Song", 1)]]);
        let mut files = vec!["zz.wav".to_string(), "xx.wav".to_string()];
        let moves = match_tracks(&mut files, &metadata);
        assert_eq!(moves[0].src, "xx.wav");
    }

    #[test]
    fn titles_are_sanitized_for_filenames() {
        let metadata = album(vec![vec![("Either/Or: Reprise", 1)]]);
        let mut files = vec!["01 either or reprise.mp3".to_string()];
        let moves = match_tracks(&mut files, &metadata);
        assert_eq!(moves[0].dst, "01 Either_Or- Reprise.mp3");
    }

    #[test]
    fn folder_jpg_matches_any_case() {
        let metadata = album(vec![vec![("Song", 1)]]);
        let mut files = vec!["FOLDER.JPG".to_string()];
        let (moves, downloads) = match_album_art(&mut files, &metadata);
        assert_eq!(moves, vec![MoveOp { src: "FOLDER.JPG".to_string(), dst: "Folder.jpg".to_string() }]);
        assert!(downloads.is_empty());
        assert!(files.is_empty());
    }

    #[test]
    fn artist_album_jpg_is_the_fallback_large_cover() {
        let metadata = album(vec![vec![("Song", 1)]]);
        let mut files = vec!["artist - album.jpg".to_string()];
        let (moves, _) = match_album_art(&mut files, &metadata);
        assert_eq!(moves[0].dst, "Folder.jpg");
    }

    #[test]
    fn primary_large_cover_wins_over_fallback() {
        let metadata = album(vec![vec![("Song", 1)]]);
        let mut files = vec!["Artist - Album.jpg".to_string(), "folder.jpg".to_string()];
        let (moves, _) = match_album_art(&mut files, &metadata);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].src, "folder.jpg");
        // the fallback stays in the pool (and will be deleted as a leftover)
        assert_eq!(files, vec!["Artist - Album.jpg"]);
    }

    #[test]
    fn missing_art_with_uri_becomes_download() {
        let metadata = with_images(album(vec![vec![("Song", 1)]]), "http://img/s.jpg", "http://img/l.jpg");
        let mut files = Vec::new();
        let (moves, downloads) = match_album_art(&mut files, &metadata);
        assert!(moves.is_empty());
        assert_eq!(
            downloads,
            vec![
                DownloadOp { src: "http://img/s.jpg".to_string(), dst: "AlbumArtSmall.jpg".to_string() },
                DownloadOp { src: "http://img/l.jpg".to_string(), dst: "Folder.jpg".to_string() },
            ]
        );
    }

    #[test]
    fn art_roles_resolve_independently() {
        let metadata = with_images(album(vec![vec![("Song", 1)]]), "http://img/s.jpg", "http://img/l.jpg");
        let mut files = vec!["folder.jpg".to_string()];
        let (moves, downloads) = match_album_art(&mut files, &metadata);
        assert_eq!(moves.len(), 1);
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].dst, "AlbumArtSmall.jpg");
    }

    #[test]
    fn empty_uri_is_not_downloaded() {
        let metadata = with_images(album(vec![vec![("Song", 1)]]), "", "");
        let mut files = Vec::new();
        let (_, downloads) = match_album_art(&mut files, &metadata);
        assert!(downloads.is_empty());
    }

    #[test]
    fn nested_art_moves_to_album_root() {
        let metadata = album(vec![vec![("Song", 1)]]);
        let mut files = vec!["scans/folder.jpg".to_string()];
        let (moves, _) = match_album_art(&mut files, &metadata);
        assert_eq!(
            moves,
            vec![MoveOp { src: "scans/folder.jpg".to_string(), dst: "Folder.jpg".to_string() }]
        );
    }
}
