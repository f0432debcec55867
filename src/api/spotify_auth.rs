//! Manual authorization-code helper:
//! 1. Build the Spotify authorization URL and print it.
//! 2. User approves in a browser and is redirected to the redirect URI (which may fail to load).
//! 3. User pastes the full redirect URL back into the CLI.
//! 4. The `code` param is exchanged for an access token.
//! 5. The token is written as JSON to `token_path`, where the catalog client picks it up.
//!
//! Token refresh is out of scope; rerun this when the token expires.

use crate::config::Config;
use crate::token::{save_stored_token, StoredToken};
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use url::Url;

pub const SCOPES: &[&str] = &[
    "playlist-read-private",
    "playlist-modify-private",
    "playlist-modify-public",
];

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

pub fn authorize_url(auth_base: &str, client_id: &str, redirect_uri: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/authorize", auth_base.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("redirect_uri", redirect_uri);
    Ok(url)
}

/// Pull the `code` query param out of a pasted redirect URL.
pub fn extract_code(redirect_url: &str) -> Result<String> {
    let parsed = Url::parse(redirect_url.trim()).map_err(|e| anyhow!("invalid url pasted: {}", e))?;
    if let Some((_, err)) = parsed.query_pairs().find(|(k, _)| k == "error") {
        return Err(anyhow!("authorization was denied: {}", err));
    }
    let code = parsed
        .query_pairs()
        .find(|(k, _)| k == "code")
        .ok_or_else(|| anyhow!("no code in redirect URL"))?
        .1
        .into_owned();
    Ok(code)
}

/// Exchange an authorization code at `<auth_base>/api/token`.
pub async fn exchange_code(
    auth_base: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<StoredToken> {
    let client = Client::new();
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];
    let auth_header = format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{}:{}", client_id, client_secret))
    );
    let resp = client
        .post(format!("{}/api/token", auth_base.trim_end_matches('/')))
        .header("Authorization", auth_header)
        .form(&params)
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        return Err(anyhow!("token exchange failed: {} => {}", status, txt));
    }

    let tr: TokenResponse = resp.json().await?;
    Ok(StoredToken {
        access_token: tr.access_token,
        token_type: tr.token_type,
        expires_at: chrono::Utc::now().timestamp() + tr.expires_in,
        refresh_token: tr.refresh_token,
        scope: tr.scope,
    })
}

fn prompt(question: &str) -> Result<String> {
    println!("{}", question);
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Interactive flow behind `disco-dive auth`.
pub async fn run_spotify_auth(cfg: &Config) -> Result<()> {
    let client_id = prompt("Enter your Spotify client_id:")?;
    if client_id.is_empty() {
        return Err(anyhow!("no client_id provided"));
    }
    let client_secret = prompt("Enter your Spotify client_secret:")?;
    if client_secret.is_empty() {
        return Err(anyhow!("no client_secret provided"));
    }
    let redirect_uri = prompt(&format!(
        "Enter your Spotify redirect URI (leave blank for {}):",
        DEFAULT_REDIRECT_URI
    ))?;
    let redirect_uri = if redirect_uri.is_empty() {
        DEFAULT_REDIRECT_URI.to_string()
    } else {
        redirect_uri
    };

    let url = authorize_url(&cfg.auth_base, &client_id, &redirect_uri)?;
    println!(
        "Open this URL in your browser and authorize the application:\n\n{}\n",
        url
    );
    let pasted = prompt("After authorizing, paste the full redirect URL here:")?;
    let code = extract_code(&pasted)?;

    let token = exchange_code(
        &cfg.auth_base,
        &client_id,
        &client_secret,
        &code,
        &redirect_uri,
    )
    .await?;
    save_stored_token(&cfg.token_path, &token)?;

    info!("Spotify token saved to {}", cfg.token_path.display());
    println!("Saved token. You can now run `disco-dive dive <playlist-id>`.");
    Ok(())
}
