use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::MAX_TRACKS_PER_REQUEST;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Catalog endpoints; env vars override the built-in defaults (useful for tests).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_auth_base")]
    pub auth_base: String,

    // Admission gate
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default = "default_admission_poll_secs")]
    pub admission_poll_secs: u64,

    // Write-back
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_insert_position")]
    pub insert_position: u32,
    // TOML has no null, so appending is a separate switch.
    #[serde(default)]
    pub append_tracks: bool,
    #[serde(default = "default_playlist_name_template")]
    pub playlist_name_template: String,

    // Request pacing
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_api_base() -> String {
    env::var("SPOTIFY_API_BASE").unwrap_or_else(|_| "https://api.spotify.com/v1".into())
}
fn default_auth_base() -> String {
    env::var("SPOTIFY_AUTH_BASE").unwrap_or_else(|_| "https://accounts.spotify.com".into())
}
fn default_max_concurrent_jobs() -> usize { crate::gate::DEFAULT_JOB_LIMIT }
fn default_admission_poll_secs() -> u64 { crate::gate::DEFAULT_POLL_INTERVAL.as_secs() }
fn default_max_batch_size() -> usize { MAX_TRACKS_PER_REQUEST }
fn default_insert_position() -> u32 { 0 }
fn default_playlist_name_template() -> String { crate::util::DEFAULT_NAME_TEMPLATE.into() }
fn default_request_delay_ms() -> u64 { 1000 }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_page_limit() -> u32 { 50 }

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join("disco-dive")
}
fn default_token_path() -> PathBuf { app_dir(dirs::config_dir()).join("token.json") }
fn default_log_dir() -> PathBuf { app_dir(dirs::data_local_dir()).join("logs") }

/// Per-user config file location, used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    app_dir(dirs::config_dir()).join("config.toml")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            auth_base: default_auth_base(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            admission_poll_secs: default_admission_poll_secs(),
            max_batch_size: default_max_batch_size(),
            insert_position: default_insert_position(),
            append_tracks: false,
            playlist_name_template: default_playlist_name_template(),
            request_delay_ms: default_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            page_limit: default_page_limit(),
            token_path: default_token_path(),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        Ok(cfg)
    }

    /// Batch size clamped to what the catalog accepts per request.
    pub fn batch_size(&self) -> usize {
        self.max_batch_size.clamp(1, MAX_TRACKS_PER_REQUEST)
    }

    /// Spotify caps album and discography pages at 50 items.
    pub fn page_limit(&self) -> u32 {
        self.page_limit.clamp(1, 50)
    }

    /// At least one second; a zero interval would spin the waiters.
    pub fn admission_poll_interval(&self) -> Duration {
        Duration::from_secs(self.admission_poll_secs.max(1))
    }

    /// Position sent with each add-tracks call; `None` appends.
    pub fn insert_position(&self) -> Option<u32> {
        if self.append_tracks {
            None
        } else {
            Some(self.insert_position)
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
