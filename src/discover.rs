//! Library layout discovery.
//!
//! The base directory contains one directory per artist; each artist
//! directory contains one directory per album named `"[YYYY] AlbumName"`.
//! Anything else is skipped with a warning.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::IgnoreList;

/// Optional ignore-list filename, looked up in the working directory.
pub const IGNORE_LIST_FILE: &str = "ignorelist";

static ALBUM_DIR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d{4})\] (.*)$").unwrap());

/// One album directory eligible for reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlbumDir {
    pub path: PathBuf,
    pub artist: String,
    pub album: String,
    pub year: String,
}

impl AlbumDir {
    /// Key of this album in the status store.
    pub fn status_key(&self) -> String {
        format!("{} - [{}] - {}", self.artist, self.year, self.album)
    }
}

/// Load the ignore list; a missing file means empty lists.
pub fn load_ignore_list(path: &Path) -> Result<IgnoreList> {
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("malformed ignore list {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(IgnoreList::default()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read ignore list {}", path.display()))
        }
    }
}

/// Directory names under `dir`, sorted for deterministic iteration.
fn sorted_dir_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Enumerate album directories under `base_dir`, skipping dot-directories
/// and everything on the ignore list.
pub fn discover_albums(base_dir: &Path, ignore: &IgnoreList) -> Result<Vec<AlbumDir>> {
    let mut albums = Vec::new();
    for artist in sorted_dir_names(base_dir)? {
        if artist.starts_with('.') || ignore.artists.contains(&artist) {
            warn!(artist = %artist, "skipping ignored artist dir");
            continue;
        }
        let artist_dir = base_dir.join(&artist);
        for album_dirname in sorted_dir_names(&artist_dir)? {
            let Some(caps) = ALBUM_DIR_PATTERN.captures(&album_dirname) else {
                warn!("skipping unmatched dir: {artist}/{album_dirname}");
                continue;
            };
            let (year, album) = (caps[1].to_string(), caps[2].to_string());
            if ignore.albums.contains(&album) {
                warn!(album = %album, "skipping ignored album dir");
                continue;
            }
            albums.push(AlbumDir {
                path: artist_dir.join(&album_dirname),
                artist: artist.clone(),
                album,
                year,
            });
        }
    }
    Ok(albums)
}
