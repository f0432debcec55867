use crate::models::Track;
use std::collections::HashSet;

pub const DEFAULT_NAME_TEMPLATE: &str = "Disco Dive : ${playlist_name}";

/// Placeholder used in progress logs when an artist id has no display name.
pub const UNKNOWN_ARTIST: &str = "Can't find artist name";

pub fn expand_template(template: &str, playlist_name: &str) -> String {
    template.replace("${playlist_name}", playlist_name)
}

/// Drop repeated URIs, keeping the first occurrence of each.
pub fn dedup_preserving_order(uris: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut uris = uris;
    uris.retain(|u| seen.insert(u.clone()));
    uris
}

/// Union of the artist ids listed on every track.
pub fn derive_artist_ids(tracks: &[Track]) -> HashSet<String> {
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .map(|a| a.id.clone())
        .collect()
}

/// Human-readable name for an artist id, taken from the first seed track that
/// references it. Only used for logging.
pub fn artist_display_name<'a>(tracks: &'a [Track], artist_id: &str) -> &'a str {
    tracks
        .iter()
        .find(|t| t.artists.iter().any(|a| a.id == artist_id))
        .and_then(|t| t.artists.first())
        .map(|a| a.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_ARTIST)
}
