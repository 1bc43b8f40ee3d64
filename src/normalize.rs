//! Title and filename normalization.
//!
//! `normalize_title` canonicalizes the capitalization of track and album
//! titles; `sanitize_filename` makes a title safe to use as a filename.
//! Both are pure and idempotent.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Canonical casing for articles, conjunctions and short prepositions.
/// Looked up case-insensitively; anything absent keeps its own casing.
static TOKEN_MAP: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    m.insert("a", "a");
    m.insert("and", "and");
    m.insert("for", "For");
    m.insert("from", "From");
    m.insert("in", "In");
    m.insert("is", "Is");
    m.insert("it", "It");
    m.insert("of", "of");
    m.insert("on", "On");
    m.insert("to", "to");
    m.insert("the", "the");
    m
});

/// First letter upper, rest lower.
fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Normalize one token given the raw token preceding it.
///
/// The exception table applies first; the first token of a title, and any
/// token following a `-` or `_` token, is force-capitalized regardless.
fn normalize_token(token: &str, prev: Option<&str>) -> String {
    let mapped = TOKEN_MAP
        .get(token.to_lowercase().as_str())
        .map_or(token, |canonical| *canonical);
    match prev {
        None | Some("-") | Some("_") => capitalize(mapped),
        _ => mapped.to_string(),
    }
}

/// Normalize a track or album title.
pub fn normalize_title(title: &str) -> String {
    let mut tokens = Vec::new();
    let mut prev: Option<&str> = None;
    for token in title.split(' ') {
        tokens.push(normalize_token(token, prev));
        prev = Some(token);
    }
    tokens.join(" ")
}

/// Replace filesystem-unsafe characters for the filename-rendering path.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            ':' => '-',
            other => other,
        })
        .collect()
}
