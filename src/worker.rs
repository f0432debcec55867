use crate::api::{Catalog, MAX_TRACKS_PER_REQUEST};
use crate::cache::{CacheCategory, ResponseCache};
use crate::config::Config;
use crate::error::{CatalogError, CatalogResult};
use crate::gate::ConcurrencyGate;
use crate::models::{Album, Track};
use crate::util::{artist_display_name, dedup_preserving_order, derive_artist_ids, expand_template};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Knobs for a worker; `from_config` is what the CLI uses.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub batch_size: usize,
    pub request_delay: Duration,
    pub name_template: String,
    pub insert_position: Option<u32>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_TRACKS_PER_REQUEST,
            request_delay: Duration::from_millis(1000),
            name_template: crate::util::DEFAULT_NAME_TEMPLATE.into(),
            insert_position: Some(0),
        }
    }
}

impl WorkerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            batch_size: cfg.batch_size(),
            request_delay: cfg.request_delay(),
            name_template: cfg.playlist_name_template.clone(),
            insert_position: cfg.insert_position(),
        }
    }
}

/// Result of one add_tracks call during write-back.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchOutcome {
    pub index: usize,
    pub size: usize,
    pub error: Option<String>,
}

/// What a successful job did, including the units it had to skip.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: String,
    pub source_playlist_id: String,
    pub source_playlist_name: String,
    pub destination_playlist_id: String,
    pub destination_playlist_name: String,
    pub artist_count: usize,
    pub raw_track_count: usize,
    pub unique_track_count: usize,
    pub skipped_artists: Vec<String>,
    pub skipped_albums: Vec<String>,
    pub batches: Vec<BatchOutcome>,
    /// URIs from failed batches, i.e. what the destination playlist is missing.
    pub dropped_uris: Vec<String>,
}

impl JobReport {
    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.error.is_some()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded(JobReport),
    Failed { reason: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }

    pub fn report(&self) -> Option<&JobReport> {
        match self {
            JobOutcome::Succeeded(r) => Some(r),
            JobOutcome::Failed { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            JobOutcome::Succeeded(_) => None,
            JobOutcome::Failed { reason } => Some(reason),
        }
    }
}

/// Aggregation workflow: seed playlist -> artists -> discographies -> new playlist.
///
/// The catalog, cache and gate are shared, so one `Worker` (behind an `Arc`
/// or borrowed) can run many jobs concurrently; the gate bounds how many get
/// past admission at once.
pub struct Worker {
    catalog: Arc<dyn Catalog>,
    cache: Arc<ResponseCache>,
    gate: Arc<ConcurrencyGate>,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        cache: Arc<ResponseCache>,
        gate: Arc<ConcurrencyGate>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            catalog,
            cache,
            gate,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.gate
    }

    /// Run one job to completion. Never panics on catalog failures; anything
    /// fatal comes back as `JobOutcome::Failed`.
    pub async fn start_job(&self, playlist_id: &str) -> JobOutcome {
        let job_id = Uuid::new_v4().to_string();
        info!(
            "Job {}: starting for playlist {} on {}",
            job_id,
            playlist_id,
            self.catalog.name()
        );
        match self.run_job(&job_id, playlist_id).await {
            Ok(report) => {
                info!(
                    "Job {}: Disco Dive playlist {} created with {} tracks ({} failed batches)",
                    job_id,
                    report.destination_playlist_name,
                    report.unique_track_count,
                    report.failed_batches()
                );
                JobOutcome::Succeeded(report)
            }
            Err(e) => {
                error!("Job {}: failed: {:#}", job_id, e);
                JobOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    async fn run_job(&self, job_id: &str, playlist_id: &str) -> Result<JobReport> {
        // Resolve identity and the seed playlist; no job without them.
        let profile = self
            .catalog
            .get_profile()
            .await
            .context("fetching user profile")?;
        let user_id = profile.id;
        debug!("Job {}: resolved user {}", job_id, user_id);
        let seed_tracks = self
            .catalog
            .get_playlist_tracks(playlist_id)
            .await
            .with_context(|| format!("fetching tracks of playlist {}", playlist_id))?;
        let seed = self
            .catalog
            .get_playlist_meta(playlist_id)
            .await
            .with_context(|| format!("fetching playlist {}", playlist_id))?;

        // Released on every exit path below.
        let _permit = self.gate.acquire(&seed.name).await;
        info!("Job {}: Processing playlist: {}", job_id, seed.name);

        let artist_ids = derive_artist_ids(&seed_tracks);
        info!("Job {}: {} distinct artists", job_id, artist_ids.len());

        let mut accumulated: Vec<String> = Vec::new();
        let mut skipped_artists: Vec<String> = Vec::new();
        let mut skipped_albums: Vec<String> = Vec::new();
        let total = artist_ids.len();

        for (n, artist_id) in artist_ids.iter().enumerate() {
            info!(
                "Job {}: Processing artist: {} {}/{}",
                job_id,
                artist_display_name(&seed_tracks, artist_id),
                n + 1,
                total
            );
            let albums = match self.artist_albums(artist_id).await {
                Ok(albums) => albums,
                Err(e) => {
                    abort_on_auth(&e)?;
                    warn!("Job {}: Error processing artist {}: {}", job_id, artist_id, e);
                    skipped_artists.push(artist_id.clone());
                    continue;
                }
            };
            for album in albums.iter() {
                match self.album_tracks(&album.id).await {
                    Ok(tracks) => accumulated.extend(tracks.iter().map(|t| t.uri.clone())),
                    Err(e) => {
                        abort_on_auth(&e)?;
                        warn!(
                            "Job {}: Error processing album {} ({}): {}",
                            job_id, album.name, album.id, e
                        );
                        skipped_albums.push(album.id.clone());
                    }
                }
            }
        }

        let destination_name = expand_template(&self.settings.name_template, &seed.name);
        let destination = self
            .catalog
            .create_playlist(&user_id, &destination_name)
            .await
            .with_context(|| format!("creating playlist {}", destination_name))?;

        let raw_track_count = accumulated.len();
        let uris = dedup_preserving_order(accumulated);
        info!(
            "Job {}: Total tracks to add: {} for Playlist: {}",
            job_id,
            uris.len(),
            seed.name
        );

        let (batches, dropped_uris) = self.write_back(job_id, &destination.id, &uris).await;

        Ok(JobReport {
            job_id: job_id.to_string(),
            source_playlist_id: playlist_id.to_string(),
            source_playlist_name: seed.name,
            destination_playlist_id: destination.id,
            destination_playlist_name: destination_name,
            artist_count: total,
            raw_track_count,
            unique_track_count: uris.len(),
            skipped_artists,
            skipped_albums,
            batches,
            dropped_uris,
        })
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size.clamp(1, MAX_TRACKS_PER_REQUEST)
    }

    /// Write `uris` in front-to-back batches. A failed batch is logged and
    /// recorded; later batches are still attempted. Returns the per-batch
    /// outcomes and the URIs that did not make it.
    async fn write_back(
        &self,
        job_id: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> (Vec<BatchOutcome>, Vec<String>) {
        let mut outcomes = Vec::new();
        let mut dropped = Vec::new();
        for (index, chunk) in uris.chunks(self.batch_size()).enumerate() {
            let res = self
                .catalog
                .add_tracks(playlist_id, chunk, self.settings.insert_position)
                .await;
            let error = match res {
                Ok(()) => {
                    debug!("Job {}: added batch {} ({} tracks)", job_id, index, chunk.len());
                    None
                }
                Err(e) => {
                    warn!(
                        "Job {}: failed to add batch {} ({} tracks) to {}: {}",
                        job_id,
                        index,
                        chunk.len(),
                        playlist_id,
                        e
                    );
                    dropped.extend_from_slice(chunk);
                    Some(e.to_string())
                }
            };
            outcomes.push(BatchOutcome {
                index,
                size: chunk.len(),
                error,
            });
        }
        (outcomes, dropped)
    }

    /// Artist discography, from the cache when present.
    pub async fn artist_albums(&self, artist_id: &str) -> CatalogResult<Arc<Vec<Album>>> {
        if let Some(hit) = self.cache.albums_for(artist_id) {
            debug!("Returning from {} cache", CacheCategory::ArtistDiscography);
            return Ok(hit);
        }
        self.pace().await;
        let albums = Arc::new(self.catalog.get_artist_albums(artist_id).await?);
        self.cache.put_albums(artist_id, Arc::clone(&albums));
        Ok(albums)
    }

    /// Album tracklist, from the cache when present.
    pub async fn album_tracks(&self, album_id: &str) -> CatalogResult<Arc<Vec<Track>>> {
        if let Some(hit) = self.cache.tracks_for(album_id) {
            debug!("Returning from {} cache", CacheCategory::AlbumTracklist);
            return Ok(hit);
        }
        self.pace().await;
        let tracks = Arc::new(self.catalog.get_album_tracks(album_id).await?);
        self.cache.put_tracks(album_id, Arc::clone(&tracks));
        Ok(tracks)
    }

    async fn pace(&self) {
        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }
    }
}

/// An invalid token fails every later call too, so stop the job there.
fn abort_on_auth(e: &CatalogError) -> Result<()> {
    if e.is_auth() {
        return Err(anyhow!(e.clone()).context("catalog rejected the access token"));
    }
    Ok(())
}
