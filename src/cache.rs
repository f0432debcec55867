use crate::models::{Album, Track};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    ArtistDiscography,
    AlbumTracklist,
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheCategory::ArtistDiscography => write!(f, "ALBUM_ARTIST"),
            CacheCategory::AlbumTracklist => write!(f, "ALBUM_TRACKS"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedResponse {
    Albums(Arc<Vec<Album>>),
    Tracks(Arc<Vec<Track>>),
}

/// Process-wide memo of discography lookups.
///
/// Entries never expire and are shared by every job in the process. Two jobs
/// that miss the same key concurrently both fetch it and the later `put` wins.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<(CacheCategory, String), CachedResponse>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: CacheCategory, key: &str) -> Option<CachedResponse> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(category, key.to_string())).cloned()
    }

    pub fn put(&self, category: CacheCategory, key: &str, value: CachedResponse) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert((category, key.to_string()), value);
    }

    pub fn albums_for(&self, artist_id: &str) -> Option<Arc<Vec<Album>>> {
        match self.get(CacheCategory::ArtistDiscography, artist_id) {
            Some(CachedResponse::Albums(a)) => Some(a),
            _ => None,
        }
    }

    pub fn put_albums(&self, artist_id: &str, albums: Arc<Vec<Album>>) {
        self.put(CacheCategory::ArtistDiscography, artist_id, CachedResponse::Albums(albums));
    }

    pub fn tracks_for(&self, album_id: &str) -> Option<Arc<Vec<Track>>> {
        match self.get(CacheCategory::AlbumTracklist, album_id) {
            Some(CachedResponse::Tracks(t)) => Some(t),
            _ => None,
        }
    }

    pub fn put_tracks(&self, album_id: &str, tracks: Arc<Vec<Track>>) {
        self.put(CacheCategory::AlbumTracklist, album_id, CachedResponse::Tracks(tracks));
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
