use disco_dive::api::spotify::SpotifyCatalog;
use disco_dive::api::Catalog;
use disco_dive::error::CatalogError;
use disco_dive::token::TokenContext;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn catalog(base: &str) -> SpotifyCatalog {
    let token = Arc::new(TokenContext::new(Some("tok".into())));
    SpotifyCatalog::new(base, token, Duration::from_secs(5)).unwrap()
}

fn track_json(id: &str, artists: &[(&str, &str)]) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Track {}", id),
        "uri": format!("spotify:track:{}", id),
        "artists": artists
            .iter()
            .map(|(aid, name)| json!({ "id": aid, "name": name }))
            .collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn profile_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "user1", "display_name": "User One" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let profile = catalog(&server.url()).get_profile().await.unwrap();
    assert_eq!(profile.id, "user1");
    assert_eq!(profile.display_name.as_deref(), Some("User One"));
    m.assert_async().await;
}

#[tokio::test]
async fn playlist_tracks_follow_next_links_and_skip_null_tracks() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let page1 = json!({
        "items": [
            { "track": track_json("t1", &[("A", "Artist A")]) },
            { "track": null },
        ],
        "next": format!("{}/playlists/p1/tracks?offset=100&limit=100", base),
    });
    let page2 = json!({
        "items": [
            { "track": track_json("t2", &[("A", "Artist A"), ("B", "Artist B")]) },
        ],
        "next": null,
    });

    let m1 = server
        .mock("GET", "/playlists/p1/tracks")
        .match_query(Matcher::Exact("limit=100".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page1.to_string())
        .expect(1)
        .create_async()
        .await;
    let m2 = server
        .mock("GET", "/playlists/p1/tracks")
        .match_query(Matcher::Exact("offset=100&limit=100".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page2.to_string())
        .expect(1)
        .create_async()
        .await;

    let tracks = catalog(&base).get_playlist_tracks("p1").await.unwrap();
    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
    assert_eq!(tracks[1].artists.len(), 2);
    assert_eq!(tracks[0].uri, "spotify:track:t1");
    m1.assert_async().await;
    m2.assert_async().await;
}

#[tokio::test]
async fn playlist_meta_reads_name_and_owner() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/playlists/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "id": "p1", "name": "Road Trip", "owner": { "id": "owner1" } }).to_string(),
        )
        .create_async()
        .await;

    let meta = catalog(&server.url()).get_playlist_meta("p1").await.unwrap();
    assert_eq!(meta.name, "Road Trip");
    assert_eq!(meta.owner_id, "owner1");
    assert!(meta.tracks.is_empty());
}

#[tokio::test]
async fn discography_and_tracklist_use_page_limit() {
    let mut server = Server::new_async().await;
    let m_albums = server
        .mock("GET", "/artists/A/albums")
        .match_query(Matcher::UrlEncoded("limit".into(), "20".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    { "id": "al1", "name": "First", "artists": [{ "id": "A" }] },
                    { "id": "al2", "name": "Second", "artists": [{ "id": "A" }, { "id": "B" }] },
                ],
                "next": null,
            })
            .to_string(),
        )
        .create_async()
        .await;
    let m_tracks = server
        .mock("GET", "/albums/al1/tracks")
        .match_query(Matcher::UrlEncoded("limit".into(), "20".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "items": [track_json("x1", &[("A", "Artist A")])], "next": null })
                .to_string(),
        )
        .create_async()
        .await;

    let c = catalog(&server.url()).with_page_limit(20);
    let albums = c.get_artist_albums("A").await.unwrap();
    assert_eq!(albums.len(), 2);
    assert_eq!(albums[1].artist_ids, vec!["A".to_string(), "B".to_string()]);

    let tracks = c.get_album_tracks("al1").await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].uri, "spotify:track:x1");
    m_albums.assert_async().await;
    m_tracks.assert_async().await;
}

#[tokio::test]
async fn status_codes_map_to_catalog_errors() {
    let mut server = Server::new_async().await;
    let _unauth = server
        .mock("GET", "/me")
        .with_status(401)
        .with_body("{\"error\":\"expired\"}")
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/playlists/missing")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    let _limited = server
        .mock("GET", "/artists/busy/albums")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/albums/broken/tracks")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let _forbidden = server
        .mock("GET", "/artists/locked/albums")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;
    let _bad = server
        .mock("GET", "/albums/bad/tracks")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body("bad request")
        .create_async()
        .await;

    let c = catalog(&server.url());
    assert!(c.get_profile().await.unwrap_err().is_auth());
    assert_eq!(
        c.get_playlist_meta("missing").await.unwrap_err(),
        CatalogError::NotFound("/playlists/missing".into())
    );
    assert_eq!(
        c.get_artist_albums("busy").await.unwrap_err(),
        CatalogError::RateLimited { retry_after: Some(7) }
    );
    assert!(matches!(
        c.get_album_tracks("broken").await.unwrap_err(),
        CatalogError::Transport(_)
    ));
    let forbidden = c.get_artist_albums("locked").await.unwrap_err();
    assert!(!forbidden.is_auth());
    assert!(matches!(forbidden, CatalogError::Api { status: 403, .. }));
    assert!(matches!(
        c.get_album_tracks("bad").await.unwrap_err(),
        CatalogError::Api { status: 400, .. }
    ));
}

#[tokio::test]
async fn page_without_items_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/albums/al1/tracks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "unexpected": true }).to_string())
        .create_async()
        .await;

    let err = catalog(&server.url()).get_album_tracks("al1").await.unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)));
}

#[tokio::test]
async fn create_playlist_is_private() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/users/user1/playlists")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Json(json!({ "name": "Disco Dive : Road Trip", "public": false })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "new1", "name": "Disco Dive : Road Trip" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let p = catalog(&server.url())
        .create_playlist("user1", "Disco Dive : Road Trip")
        .await
        .unwrap();
    assert_eq!(p.id, "new1");
    assert_eq!(p.owner_id, "user1");
    m.assert_async().await;
}

#[tokio::test]
async fn add_tracks_sends_uris_and_position() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/playlists/new1/tracks")
        .match_body(Matcher::Json(json!({
            "uris": ["spotify:track:a", "spotify:track:b"],
            "position": 0
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "snapshot_id": "s1" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let uris = vec!["spotify:track:a".to_string(), "spotify:track:b".to_string()];
    catalog(&server.url())
        .add_tracks("new1", &uris, Some(0))
        .await
        .unwrap();
    m.assert_async().await;
}

#[tokio::test]
async fn add_tracks_rejects_oversized_batch_without_a_request() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/playlists/new1/tracks")
        .expect(0)
        .create_async()
        .await;

    let uris: Vec<String> = (0..101).map(|i| format!("spotify:track:{}", i)).collect();
    let err = catalog(&server.url())
        .add_tracks("new1", &uris, Some(0))
        .await
        .unwrap_err();
    assert_eq!(err, CatalogError::BatchTooLarge { size: 101, max: 100 });
    m.assert_async().await;
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let m = server.mock("GET", "/me").expect(0).create_async().await;

    let token = Arc::new(TokenContext::default());
    let c = SpotifyCatalog::new(server.url(), token, Duration::from_secs(5)).unwrap();
    assert!(c.get_profile().await.unwrap_err().is_auth());
    m.assert_async().await;
}
