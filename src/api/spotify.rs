use super::{Catalog, MAX_TRACKS_PER_REQUEST};
use crate::config::Config;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Album, Artist, Playlist, Profile, Track};
use crate::token::TokenContext;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Spotify playlist track pages are capped at 100 items.
const PLAYLIST_PAGE_LIMIT: u32 = 100;

/// Catalog backed by the Spotify Web API.
/// The base URL comes from config so tests can point it at a mock server.
pub struct SpotifyCatalog {
    client: Client,
    api_base: String,
    page_limit: u32,
    token: Arc<TokenContext>,
}

impl SpotifyCatalog {
    pub fn new(
        api_base: impl Into<String>,
        token: Arc<TokenContext>,
        timeout: Duration,
    ) -> CatalogResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            page_limit: 50,
            token,
        })
    }

    pub fn from_config(cfg: &Config, token: Arc<TokenContext>) -> CatalogResult<Self> {
        let mut catalog = Self::new(cfg.api_base.clone(), token, cfg.request_timeout())?;
        catalog.page_limit = cfg.page_limit();
        Ok(catalog)
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.clamp(1, 50);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Map a non-success response onto the error taxonomy.
    async fn check_status(resp: Response) -> CatalogResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let path = resp.url().path().to_string();
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let txt = resp.text().await.unwrap_or_default();
        let err = match status {
            // 403 is per-resource on Spotify; only 401 means the token itself is bad.
            StatusCode::UNAUTHORIZED => CatalogError::Auth(format!("{} => {}", status, txt)),
            StatusCode::NOT_FOUND => CatalogError::NotFound(path.clone()),
            StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited { retry_after },
            s if s.is_server_error() => CatalogError::Transport(format!("{} => {}", s, txt)),
            s => CatalogError::Api {
                status: s.as_u16(),
                message: txt,
            },
        };
        debug!("Spotify request to {} failed: {}", path, err);
        Err(err)
    }

    async fn get_json(&self, url: &str) -> CatalogResult<Value> {
        let bearer = self.token.bearer().await?;
        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, &bearer)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.json::<Value>().await?)
    }

    async fn post_json(&self, url: &str, body: &Value) -> CatalogResult<Value> {
        let bearer = self.token.bearer().await?;
        let resp = self
            .client
            .post(url)
            .header(AUTHORIZATION, &bearer)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.json::<Value>().await?)
    }

    /// Follow `next` links from `first_url`, parsing every entry of `items`.
    /// Entries the parser rejects (null tracks, local files) are skipped.
    async fn collect_pages<T: Send>(
        &self,
        first_url: String,
        parse: fn(&Value) -> Option<T>,
    ) -> CatalogResult<Vec<T>> {
        let mut out = Vec::new();
        let mut next = Some(first_url);
        while let Some(url) = next {
            let j = self.get_json(&url).await?;
            match j["items"].as_array() {
                Some(items) => out.extend(items.iter().filter_map(parse)),
                None => return Err(CatalogError::Decode(format!("no items array in page {}", url))),
            }
            next = j["next"].as_str().map(|s| s.to_string());
        }
        Ok(out)
    }
}

fn encode(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

fn parse_artist(v: &Value) -> Option<Artist> {
    let id = v["id"].as_str()?;
    Some(Artist {
        id: id.to_string(),
        name: v["name"].as_str().unwrap_or("").to_string(),
    })
}

fn parse_track(v: &Value) -> Option<Track> {
    let uri = v["uri"].as_str()?;
    let artists = v["artists"]
        .as_array()
        .map(|a| a.iter().filter_map(parse_artist).collect())
        .unwrap_or_default();
    Some(Track {
        id: v["id"].as_str().unwrap_or("").to_string(),
        name: v["name"].as_str().unwrap_or("").to_string(),
        artists,
        uri: uri.to_string(),
    })
}

/// Playlist items wrap the track; removed tracks come back as `"track": null`.
fn parse_playlist_item(v: &Value) -> Option<Track> {
    parse_track(&v["track"])
}

fn parse_album(v: &Value) -> Option<Album> {
    let id = v["id"].as_str()?;
    let artist_ids = v["artists"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|x| x["id"].as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    Some(Album {
        id: id.to_string(),
        name: v["name"].as_str().unwrap_or("").to_string(),
        artist_ids,
    })
}

fn parse_playlist(v: &Value, fallback_owner: &str) -> CatalogResult<Playlist> {
    let id = v["id"]
        .as_str()
        .ok_or_else(|| CatalogError::Decode("playlist without id".into()))?;
    Ok(Playlist {
        id: id.to_string(),
        name: v["name"].as_str().unwrap_or("").to_string(),
        owner_id: v["owner"]["id"].as_str().unwrap_or(fallback_owner).to_string(),
        tracks: Vec::new(),
    })
}

#[async_trait]
impl Catalog for SpotifyCatalog {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn get_profile(&self) -> CatalogResult<Profile> {
        let j = self.get_json(&self.url("/me")).await?;
        let id = j["id"]
            .as_str()
            .ok_or_else(|| CatalogError::Decode("profile without id".into()))?
            .to_string();
        Ok(Profile {
            id,
            display_name: j["display_name"].as_str().map(|s| s.to_string()),
        })
    }

    async fn get_playlist_meta(&self, playlist_id: &str) -> CatalogResult<Playlist> {
        let url = self.url(&format!(
            "/playlists/{}?fields=id,name,owner(id)",
            encode(playlist_id)
        ));
        let j = self.get_json(&url).await?;
        parse_playlist(&j, "")
    }

    async fn get_playlist_tracks(&self, playlist_id: &str) -> CatalogResult<Vec<Track>> {
        let url = self.url(&format!(
            "/playlists/{}/tracks?limit={}",
            encode(playlist_id),
            PLAYLIST_PAGE_LIMIT
        ));
        self.collect_pages(url, parse_playlist_item).await
    }

    async fn get_artist_albums(&self, artist_id: &str) -> CatalogResult<Vec<Album>> {
        let url = self.url(&format!(
            "/artists/{}/albums?limit={}",
            encode(artist_id),
            self.page_limit
        ));
        self.collect_pages(url, parse_album).await
    }

    async fn get_album_tracks(&self, album_id: &str) -> CatalogResult<Vec<Track>> {
        let url = self.url(&format!(
            "/albums/{}/tracks?limit={}",
            encode(album_id),
            self.page_limit
        ));
        self.collect_pages(url, parse_track).await
    }

    async fn create_playlist(&self, user_id: &str, name: &str) -> CatalogResult<Playlist> {
        let url = self.url(&format!("/users/{}/playlists", encode(user_id)));
        let body = json!({
            "name": name,
            "public": false
        });
        let j = self.post_json(&url, &body).await?;
        parse_playlist(&j, user_id)
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: Option<u32>,
    ) -> CatalogResult<()> {
        if uris.len() > MAX_TRACKS_PER_REQUEST {
            return Err(CatalogError::BatchTooLarge {
                size: uris.len(),
                max: MAX_TRACKS_PER_REQUEST,
            });
        }
        if uris.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("/playlists/{}/tracks", encode(playlist_id)));
        let body = match position {
            Some(p) => json!({ "uris": uris, "position": p }),
            None => json!({ "uris": uris }),
        };
        if let Err(e) = self.post_json(&url, &body).await {
            if e.is_rate_limited() {
                warn!("Spotify rate limited add_tracks for playlist {}: {}", playlist_id, e);
            }
            return Err(e);
        }
        Ok(())
    }
}
