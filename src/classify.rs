//! Album directory classification.
//!
//! Walks an album directory and partitions its contents into music files,
//! other files, and sub-directories. All paths are relative to the album
//! root and keep their nested segments (`"CD1/01 Song.mp3"`).

use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Extensions treated as music, compared case-insensitively.
const MUSIC_FILE_EXTENSIONS: [&str; 7] = ["mp3", "flac", "aac", "wav", "ogg", "oga", "wma"];

/// Partitioned listing of one album directory. The three partitions are
/// disjoint: every entry under the root lands in exactly one of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub music_files: Vec<String>,
    pub other_files: Vec<String>,
    pub sub_dirs: Vec<String>,
}

fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            MUSIC_FILE_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

/// Recursively enumerate everything under `album_path`.
pub fn list_album_dir(album_path: &Path) -> Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();
    for entry in WalkDir::new(album_path).min_depth(1) {
        let entry =
            entry.with_context(|| format!("failed to walk {}", album_path.display()))?;
        let rel = entry
            .path()
            .strip_prefix(album_path)
            .with_context(|| format!("entry escapes album root {}", album_path.display()))?
            .to_string_lossy()
            .into_owned();
        if entry.file_type().is_dir() {
            listing.sub_dirs.push(rel);
        } else if is_music_file(entry.path()) {
            listing.music_files.push(rel);
        } else {
            listing.other_files.push(rel);
        }
    }
    Ok(listing)
}
