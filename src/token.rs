use crate::error::{CatalogError, CatalogResult};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Env var consulted before the stored token file.
pub const ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

/// Token JSON as written by the `auth` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: i64, // epoch seconds
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

/// Holds the current bearer credential for the process.
/// The core only reads it; the authorization side calls `set`.
#[derive(Debug, Default)]
pub struct TokenContext {
    token: RwLock<Option<String>>,
}

impl TokenContext {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    /// Resolve the start-up token: env var first, then the stored token file.
    pub fn from_env_or_file(token_path: &Path) -> Result<Self> {
        if let Ok(tok) = std::env::var(ACCESS_TOKEN_ENV) {
            if !tok.trim().is_empty() {
                info!("Using access token from {}", ACCESS_TOKEN_ENV);
                return Ok(Self::new(Some(tok)));
            }
        }
        match load_stored_token(token_path)? {
            Some(st) => {
                if st.is_expired() {
                    warn!(
                        "Stored token at {} has expired; run `disco-dive auth` to obtain a new one",
                        token_path.display()
                    );
                }
                Ok(Self::new(Some(st.access_token)))
            }
            None => Ok(Self::new(None)),
        }
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn is_present(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Authorization header value for the current token.
    pub async fn bearer(&self) -> CatalogResult<String> {
        let lock = self.token.read().await;
        let tok = lock
            .as_ref()
            .ok_or_else(|| CatalogError::Auth("no access token loaded".into()))?;
        Ok(format!("Bearer {}", tok))
    }
}

pub fn load_stored_token(path: &Path) -> Result<Option<StoredToken>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading token file {}", path.display()))?;
    let st: StoredToken = serde_json::from_str(&s)
        .with_context(|| format!("parsing token file {}", path.display()))?;
    Ok(Some(st))
}

pub fn save_stored_token(path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating token directory {}", parent.display()))?;
    }
    let s = serde_json::to_string_pretty(token)?;
    std::fs::write(path, s).with_context(|| format!("writing token file {}", path.display()))?;
    Ok(())
}
