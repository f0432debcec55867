use super::{Catalog, MAX_TRACKS_PER_REQUEST};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Album, Playlist, Profile, Track};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::info;

/// In-memory catalog used in tests and dry runs.
/// Serves fixture data, injects configured failures and records every call.
#[derive(Default)]
pub struct MockCatalog {
    profile: Option<Profile>,
    profile_error: Option<CatalogError>,
    playlists: HashMap<String, Playlist>,
    artist_albums: HashMap<String, Vec<Album>>,
    album_tracks: HashMap<String, Vec<Track>>,
    artist_errors: HashMap<String, CatalogError>,
    album_errors: HashMap<String, CatalogError>,
    add_errors: HashMap<usize, CatalogError>,
    create_error: Option<CatalogError>,
    latency: Duration,

    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<Playlist>>,
    added: Mutex<Vec<(String, Vec<String>, Option<u32>)>>,
    add_attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, user_id: &str) -> Self {
        self.profile = Some(Profile {
            id: user_id.to_string(),
            display_name: Some(format!("mock user {}", user_id)),
        });
        self
    }

    pub fn with_playlist(mut self, id: &str, name: &str, tracks: Vec<Track>) -> Self {
        self.playlists.insert(
            id.to_string(),
            Playlist {
                id: id.to_string(),
                name: name.to_string(),
                owner_id: "mock-owner".into(),
                tracks,
            },
        );
        self
    }

    pub fn with_artist_albums(mut self, artist_id: &str, albums: Vec<Album>) -> Self {
        self.artist_albums.insert(artist_id.to_string(), albums);
        self
    }

    pub fn with_album_tracks(mut self, album_id: &str, tracks: Vec<Track>) -> Self {
        self.album_tracks.insert(album_id.to_string(), tracks);
        self
    }

    pub fn fail_profile(mut self, err: CatalogError) -> Self {
        self.profile_error = Some(err);
        self
    }

    pub fn fail_artist(mut self, artist_id: &str, err: CatalogError) -> Self {
        self.artist_errors.insert(artist_id.to_string(), err);
        self
    }

    pub fn fail_album(mut self, album_id: &str, err: CatalogError) -> Self {
        self.album_errors.insert(album_id.to_string(), err);
        self
    }

    /// Fail the `index`-th add_tracks call (0-based, counted across playlists).
    pub fn fail_add_batch(mut self, index: usize, err: CatalogError) -> Self {
        self.add_errors.insert(index, err);
        self
    }

    pub fn fail_create(mut self, err: CatalogError) -> Self {
        self.create_error = Some(err);
        self
    }

    /// Suspend every discography call for `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded calls exactly equal to `call`, e.g. "get_artist_albums:A".
    pub fn call_count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn created_playlists(&self) -> Vec<Playlist> {
        self.created.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Successful add_tracks calls: (playlist id, uris, position).
    pub fn added_batches(&self) -> Vec<(String, Vec<String>, Option<u32>)> {
        self.added.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Peak number of discography calls suspended at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Acquire)
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    async fn simulate_latency(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_in_flight.fetch_max(now, Ordering::AcqRel);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_profile(&self) -> CatalogResult<Profile> {
        self.record("get_profile".into());
        if let Some(e) = &self.profile_error {
            return Err(e.clone());
        }
        self.profile
            .clone()
            .ok_or_else(|| CatalogError::Auth("mock has no profile".into()))
    }

    async fn get_playlist_meta(&self, playlist_id: &str) -> CatalogResult<Playlist> {
        self.record(format!("get_playlist_meta:{}", playlist_id));
        self.playlists
            .get(playlist_id)
            .map(|p| Playlist {
                tracks: Vec::new(),
                ..p.clone()
            })
            .ok_or_else(|| CatalogError::NotFound(format!("/playlists/{}", playlist_id)))
    }

    async fn get_playlist_tracks(&self, playlist_id: &str) -> CatalogResult<Vec<Track>> {
        self.record(format!("get_playlist_tracks:{}", playlist_id));
        self.playlists
            .get(playlist_id)
            .map(|p| p.tracks.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("/playlists/{}/tracks", playlist_id)))
    }

    async fn get_artist_albums(&self, artist_id: &str) -> CatalogResult<Vec<Album>> {
        self.record(format!("get_artist_albums:{}", artist_id));
        self.simulate_latency().await;
        if let Some(e) = self.artist_errors.get(artist_id) {
            return Err(e.clone());
        }
        self.artist_albums
            .get(artist_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("/artists/{}/albums", artist_id)))
    }

    async fn get_album_tracks(&self, album_id: &str) -> CatalogResult<Vec<Track>> {
        self.record(format!("get_album_tracks:{}", album_id));
        self.simulate_latency().await;
        if let Some(e) = self.album_errors.get(album_id) {
            return Err(e.clone());
        }
        self.album_tracks
            .get(album_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("/albums/{}/tracks", album_id)))
    }

    async fn create_playlist(&self, user_id: &str, name: &str) -> CatalogResult<Playlist> {
        self.record(format!("create_playlist:{}:{}", user_id, name));
        info!("MockCatalog: create_playlist {} for {}", name, user_id);
        if let Some(e) = &self.create_error {
            return Err(e.clone());
        }
        let mut created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        let playlist = Playlist {
            id: format!("mock-playlist-{}", created.len() + 1),
            name: name.to_string(),
            owner_id: user_id.to_string(),
            tracks: Vec::new(),
        };
        created.push(playlist.clone());
        Ok(playlist)
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: Option<u32>,
    ) -> CatalogResult<()> {
        self.record(format!("add_tracks:{}:{}", playlist_id, uris.len()));
        info!("MockCatalog: add_tracks {} -> {} tracks", playlist_id, uris.len());
        if uris.len() > MAX_TRACKS_PER_REQUEST {
            return Err(CatalogError::BatchTooLarge {
                size: uris.len(),
                max: MAX_TRACKS_PER_REQUEST,
            });
        }
        let attempt = self.add_attempts.fetch_add(1, Ordering::AcqRel);
        if let Some(e) = self.add_errors.get(&attempt) {
            return Err(e.clone());
        }
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((playlist_id.to_string(), uris.to_vec(), position));
        Ok(())
    }
}
