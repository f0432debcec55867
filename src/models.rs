use serde::{Deserialize, Serialize};

/// An artist reference. Identity is the id; names repeat across tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
    /// Locator used when adding the track to a playlist (e.g. "spotify:track:...").
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artist_ids: Vec<String>,
}

/// Playlist metadata. `tracks` is only filled for fixtures; the catalog
/// returns metadata and track listings through separate calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: Option<String>,
}

impl Artist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>, artists: Vec<Artist>) -> Self {
        let id = id.into();
        Self {
            uri: format!("spotify:track:{}", id),
            id,
            name: name.into(),
            artists,
        }
    }
}

impl Album {
    pub fn new(id: impl Into<String>, name: impl Into<String>, artist_ids: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artist_ids: artist_ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}
