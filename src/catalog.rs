//! Remote album catalog access.
//!
//! `Catalog` is the lookup contract the reconciliation engine consumes;
//! `LastfmCatalog` is the production implementation against the Last.fm
//! `album.getInfo` API, and `CachedCatalog` is an explicit memoizing
//! wrapper that persists responses forever (album metadata is assumed
//! stable).

use serde::Deserialize;
use thiserror::Error;

use crate::models::{AlbumMetadata, Disc, ImageSize, Track};
use crate::normalize::normalize_title;
use crate::store::KeyValueStore;

const API_URL: &str = "http://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = concat!("albumfix/", env!("CARGO_PKG_VERSION"));

/// Last.fm error code for an unknown album.
const NOT_FOUND_CODE: i64 = 6;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("missing API key (set the API_KEY environment variable)")]
    MissingApiKey,
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("album not found: {artist} - {album}")]
    NotFound { artist: String, album: String },
    #[error("malformed catalog response: {0}")]
    Malformed(String),
    #[error("cache store error: {0}")]
    Store(String),
}

/// Album metadata lookup.
pub trait Catalog {
    fn album_metadata(&self, artist: &str, album: &str) -> Result<AlbumMetadata, CatalogError>;
}

// ============================================================================
// Last.fm Client
// ============================================================================

#[derive(Deserialize)]
struct ApiEnvelope {
    album: Option<AlbumResponse>,
    error: Option<i64>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct AlbumResponse {
    name: String,
    artist: String,
    #[serde(default)]
    image: Vec<ImageResponse>,
    #[serde(default)]
    tracks: TracksResponse,
}

#[derive(Deserialize)]
struct ImageResponse {
    size: String,
    #[serde(rename = "#text")]
    text: String,
}

#[derive(Deserialize, Default)]
struct TracksResponse {
    #[serde(default)]
    track: Vec<TrackResponse>,
}

#[derive(Deserialize)]
struct TrackResponse {
    name: String,
    #[serde(rename = "@attr")]
    attr: TrackAttr,
}

#[derive(Deserialize)]
struct TrackAttr {
    #[serde(deserialize_with = "rank_from_string_or_number")]
    rank: u32,
}

/// The API reports track ranks sometimes as numbers, sometimes as strings.
fn rank_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(|n| n as u32)
            .ok_or_else(|| D::Error::custom(format!("invalid track rank {n}"))),
        serde_json::Value::String(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid track rank {s:?}"))),
        other => Err(D::Error::custom(format!("invalid track rank {other}"))),
    }
}

/// Split a flat ranked track list into discs: a rank that does not continue
/// the previous one starts a new disc.
fn split_discs(tracks: Vec<TrackResponse>) -> Vec<Disc> {
    let mut discs: Vec<Disc> = Vec::new();
    for raw in tracks {
        let track = Track {
            name: normalize_title(&raw.name),
            pos: raw.attr.rank,
        };
        match discs.last_mut() {
            Some(disc) if disc.last().is_some_and(|prev| prev.pos + 1 == track.pos) => {
                disc.push(track);
            }
            _ => discs.push(vec![track]),
        }
    }
    discs
}

fn parse_response(body: &str, artist: &str, album: &str) -> Result<AlbumMetadata, CatalogError> {
    let envelope: ApiEnvelope = serde_json::from_str(body)
        .map_err(|err| CatalogError::Malformed(err.to_string()))?;
    if let Some(code) = envelope.error {
        if code == NOT_FOUND_CODE {
            return Err(CatalogError::NotFound {
                artist: artist.to_string(),
                album: album.to_string(),
            });
        }
        let message = envelope.message.unwrap_or_else(|| format!("error code {code}"));
        return Err(CatalogError::Malformed(message));
    }
    let response = envelope
        .album
        .ok_or_else(|| CatalogError::Malformed("missing album record".to_string()))?;

    let mut images = rustc_hash::FxHashMap::default();
    for image in response.image {
        let size = match image.size.as_str() {
            "small" => ImageSize::Small,
            "large" => ImageSize::Large,
            _ => continue,
        };
        if !image.text.is_empty() {
            images.insert(size, image.text);
        }
    }

    Ok(AlbumMetadata {
        artist: response.artist,
        album: normalize_title(&response.name),
        discs: split_discs(response.tracks.track),
        images,
    })
}

/// Blocking Last.fm client.
pub struct LastfmCatalog {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl LastfmCatalog {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
        }
    }

    /// Reads the key from the `API_KEY` environment variable. A missing key
    /// is a configuration error reported here, before any album is touched.
    pub fn from_env() -> Result<Self, CatalogError> {
        match std::env::var("API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::new(key)),
            _ => Err(CatalogError::MissingApiKey),
        }
    }
}

impl Catalog for LastfmCatalog {
    fn album_metadata(&self, artist: &str, album: &str) -> Result<AlbumMetadata, CatalogError> {
        let body = self
            .client
            .get(API_URL)
            .query(&[
                ("method", "album.getInfo"),
                ("artist", artist),
                ("album", album),
                ("autocorrect", "1"),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .header("User-Agent", USER_AGENT)
            .send()?
            .text()?;
        parse_response(&body, artist, album)
    }
}

// ============================================================================
// Memoizing Wrapper
// ============================================================================

/// Stable serialization of the argument tuple. serde_json maps are ordered
/// by key, so the rendering is deterministic.
pub fn default_cache_key(artist: &str, album: &str) -> String {
    serde_json::json!({ "album": album, "artist": artist }).to_string()
}

/// Memoizes any `Catalog` behind a `KeyValueStore`, with the cache key
/// derived by an explicit serialization function. Entries never expire.
pub struct CachedCatalog<C, S> {
    inner: C,
    store: S,
    key_fn: fn(&str, &str) -> String,
}

impl<C, S> CachedCatalog<C, S> {
    pub fn new(inner: C, store: S) -> Self {
        Self::with_key_fn(inner, store, default_cache_key)
    }

    pub fn with_key_fn(inner: C, store: S, key_fn: fn(&str, &str) -> String) -> Self {
        Self { inner, store, key_fn }
    }
}

impl<C: Catalog, S: KeyValueStore> Catalog for CachedCatalog<C, S> {
    fn album_metadata(&self, artist: &str, album: &str) -> Result<AlbumMetadata, CatalogError> {
        let key = (self.key_fn)(artist, album);
        if let Some(hit) = self
            .store
            .get::<AlbumMetadata>(&key)
            .map_err(|err| CatalogError::Store(format!("{err:#}")))?
        {
            return Ok(hit);
        }
        let fresh = self.inner.album_metadata(artist, album)?;
        self.store
            .put(&key, &fresh)
            .map_err(|err| CatalogError::Store(format!("{err:#}")))?;
        Ok(fresh)
    }
}
