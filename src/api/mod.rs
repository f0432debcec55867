pub mod mock;
pub mod spotify;
pub mod spotify_auth;

use crate::error::CatalogResult;
use crate::models::{Album, Playlist, Profile, Track};

/// Upper bound on URIs per `add_tracks` call; callers chunk.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Catalog trait: one operation per remote resource the workflow needs.
/// Implementations: spotify::SpotifyCatalog and mock::MockCatalog.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Profile of the user the current token belongs to.
    async fn get_profile(&self) -> CatalogResult<Profile>;

    /// Playlist metadata (id, name, owner); `tracks` is left empty.
    async fn get_playlist_meta(&self, playlist_id: &str) -> CatalogResult<Playlist>;

    /// Every track on the playlist, all pages.
    async fn get_playlist_tracks(&self, playlist_id: &str) -> CatalogResult<Vec<Track>>;

    async fn get_artist_albums(&self, artist_id: &str) -> CatalogResult<Vec<Album>>;

    async fn get_album_tracks(&self, album_id: &str) -> CatalogResult<Vec<Track>>;

    /// Create an empty, non-public playlist owned by `user_id`.
    async fn create_playlist(&self, user_id: &str, name: &str) -> CatalogResult<Playlist>;

    /// Add at most `MAX_TRACKS_PER_REQUEST` URIs, optionally at `position`.
    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: Option<u32>,
    ) -> CatalogResult<()>;

    /// Return the catalog's name (for logging)
    fn name(&self) -> &str;
}
