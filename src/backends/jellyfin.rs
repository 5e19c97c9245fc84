use std::collections::HashMap;

use serde::Deserialize;

use super::{encode_query_value, get_json, normalize_type, require_connection};
use crate::error::Result;
use crate::media::{non_empty, non_zero, progress_percent, MediaData, MediaKind};
use crate::settings::Settings;

/// Jellyfin reports times in 100ns ticks
const JELLYFIN_TICKS_PER_MS: i64 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Session {
    now_playing_item: Option<NowPlayingItem>,
    play_state: Option<PlayState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NowPlayingItem {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "Type")]
    item_type: Option<String>,
    run_time_ticks: Option<i64>,
    production_year: Option<i32>,
    series_name: Option<String>,
    parent_index_number: Option<u32>,
    index_number: Option<u32>,
    artists: Option<Vec<String>>,
    album_artist: Option<String>,
    album: Option<String>,
    image_tags: Option<HashMap<String, String>>,
    studios: Option<Vec<Studio>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Studio {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PlayState {
    position_ticks: Option<i64>,
    #[serde(default)]
    is_paused: bool,
}

pub(super) async fn fetch_now_playing(
    client: &reqwest::Client,
    settings: &Settings,
) -> Result<Option<MediaData>> {
    let (base, key) = require_connection(settings)?;

    let request = client
        .get(format!("{}/Sessions", base))
        .header("X-Emby-Token", key)
        .timeout(settings.request_timeout());
    let sessions: Vec<Session> = get_json(request).await?;

    Ok(select_session(sessions).map(|(item, state)| map_item(base, key, item, state)))
}

/// First session that is actually playing something
fn select_session(sessions: Vec<Session>) -> Option<(NowPlayingItem, PlayState)> {
    sessions.into_iter().find_map(|session| {
        session
            .now_playing_item
            .map(|item| (item, session.play_state.unwrap_or_default()))
    })
}

fn ticks_to_ms(ticks: i64) -> u64 {
    (ticks.max(0) / JELLYFIN_TICKS_PER_MS) as u64
}

fn map_kind(item: &NowPlayingItem) -> MediaKind {
    match normalize_type(item.item_type.as_deref()).as_str() {
        "movie" => MediaKind::Movie,
        "episode" => MediaKind::Episode {
            series: non_empty(item.series_name.clone()),
            season: non_zero(item.parent_index_number),
            episode: non_zero(item.index_number),
        },
        "audio" => MediaKind::Audio {
            artist: non_empty(
                item.artists
                    .as_ref()
                    .and_then(|artists| artists.first().cloned()),
            ),
            album_artist: non_empty(item.album_artist.clone()),
            album_title: non_empty(item.album.clone()),
        },
        "video" => MediaKind::Video,
        "photo" => MediaKind::Photo { photographer: None },
        _ => MediaKind::Unknown,
    }
}

fn primary_image_url(base: &str, key: &str, item: &NowPlayingItem) -> Option<String> {
    let id = item.id.as_deref().filter(|id| !id.is_empty())?;
    item.image_tags.as_ref()?.get("Primary")?;
    Some(format!(
        "{}/Items/{}/Images/Primary?api_key={}",
        base,
        id,
        encode_query_value(key)
    ))
}

fn map_item(base: &str, key: &str, item: NowPlayingItem, state: PlayState) -> MediaData {
    let duration_ms = item.run_time_ticks.map(ticks_to_ms);
    let position_ms = state.position_ticks.map(ticks_to_ms);

    MediaData {
        title: item.name.clone().unwrap_or_default(),
        kind: map_kind(&item),
        is_paused: state.is_paused,
        progress: progress_percent(position_ms.unwrap_or(0), duration_ms),
        duration_ms,
        position_ms,
        image_url: primary_image_url(base, key, &item),
        year: item.production_year,
        studio: non_empty(
            item.studios
                .as_ref()
                .and_then(|studios| studios.first())
                .and_then(|studio| studio.name.clone()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MediaSource, ServerBackends};
    use crate::media::MediaType;
    use crate::settings::Backend;
    use mockito::Server;

    const SESSIONS: &str = r#"[
        {
            "Id": "idle-session",
            "PlayState": { "IsPaused": false }
        },
        {
            "Id": "tv-session",
            "PlayState": { "PositionTicks": 12000000000, "IsPaused": true },
            "NowPlayingItem": {
                "Id": "abc123",
                "Name": "Good News About Hell",
                "Type": "Episode",
                "RunTimeTicks": 36000000000,
                "ProductionYear": 2022,
                "SeriesName": "Severance",
                "ParentIndexNumber": 1,
                "IndexNumber": 1,
                "ImageTags": { "Primary": "tag" },
                "Studios": [{ "Name": "Apple TV+" }]
            }
        },
        {
            "Id": "later-session",
            "NowPlayingItem": { "Id": "zzz", "Name": "Ignored", "Type": "Movie" }
        }
    ]"#;

    fn settings_for(url: String) -> Settings {
        Settings {
            backend: Backend::Jellyfin,
            server_url: Some(url),
            api_key: Some("secret".into()),
            ..Settings::default()
        }
    }

    fn item(item_type: &str) -> NowPlayingItem {
        serde_json::from_value(serde_json::json!({ "Id": "1", "Name": "x", "Type": item_type }))
            .unwrap()
    }

    #[test]
    fn ticks_convert_by_integer_division() {
        assert_eq!(ticks_to_ms(50_000_000), 5_000);
        assert_eq!(ticks_to_ms(9_999), 0);
        assert_eq!(ticks_to_ms(-10_000), 0);
    }

    #[test]
    fn item_types_map_case_insensitively() {
        assert_eq!(map_kind(&item("Movie")).media_type(), MediaType::Movie);
        assert_eq!(map_kind(&item("EPISODE")).media_type(), MediaType::Episode);
        assert_eq!(map_kind(&item("audio")).media_type(), MediaType::Audio);
        assert_eq!(map_kind(&item("Video")).media_type(), MediaType::Video);
        assert_eq!(map_kind(&item("Photo")).media_type(), MediaType::Photo);
        assert_eq!(map_kind(&item("TvChannel")).media_type(), MediaType::Unknown);
        assert_eq!(map_kind(&item("")).media_type(), MediaType::Unknown);
    }

    #[test]
    fn audio_takes_first_artist() {
        let item: NowPlayingItem = serde_json::from_value(serde_json::json!({
            "Id": "t1",
            "Name": "Come Together",
            "Type": "Audio",
            "Artists": ["The Beatles", "Someone Else"],
            "AlbumArtist": "The Beatles",
            "Album": "Abbey Road"
        }))
        .unwrap();

        let media = map_item("http://jf", "k", item, PlayState::default());
        assert_eq!(
            media.kind,
            MediaKind::Audio {
                artist: Some("The Beatles".into()),
                album_artist: Some("The Beatles".into()),
                album_title: Some("Abbey Road".into()),
            }
        );
        assert_eq!(media.image_url, None);
        assert_eq!(media.progress, None);
    }

    #[test]
    fn zero_runtime_leaves_progress_unset() {
        let item: NowPlayingItem = serde_json::from_value(serde_json::json!({
            "Id": "live", "Name": "Stream", "Type": "Video", "RunTimeTicks": 0
        }))
        .unwrap();
        let state = PlayState {
            position_ticks: Some(50_000_000),
            is_paused: false,
        };

        let media = map_item("http://jf", "k", item, state);
        assert_eq!(media.progress, None);
        assert_eq!(media.duration_ms, Some(0));
        assert_eq!(media.position_ms, Some(5_000));
    }

    #[tokio::test]
    async fn first_playing_session_is_mapped() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/Sessions")
            .match_header("X-Emby-Token", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SESSIONS)
            .create_async()
            .await;

        let settings = settings_for(server.url());
        let media = ServerBackends::new()
            .fetch_active(&settings)
            .await
            .expect("an active session");

        mock.assert_async().await;
        assert_eq!(media.title, "Good News About Hell");
        assert_eq!(
            media.kind,
            MediaKind::Episode {
                series: Some("Severance".into()),
                season: Some(1),
                episode: Some(1),
            }
        );
        assert!(media.is_paused);
        assert_eq!(media.duration_ms, Some(3_600_000));
        assert_eq!(media.position_ms, Some(1_200_000));
        assert_eq!(media.progress, Some(33));
        assert_eq!(media.year, Some(2022));
        assert_eq!(media.studio.as_deref(), Some("Apple TV+"));
        assert_eq!(
            media.image_url,
            Some(format!(
                "{}/Items/abc123/Images/Primary?api_key=secret",
                server.url()
            ))
        );
    }

    #[tokio::test]
    async fn no_playing_session_yields_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/Sessions")
            .with_status(200)
            .with_body(r#"[{ "Id": "idle" }]"#)
            .create_async()
            .await;

        let settings = settings_for(server.url());
        assert_eq!(ServerBackends::new().fetch_active(&settings).await, None);
    }

    #[tokio::test]
    async fn error_status_yields_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/Sessions")
            .with_status(401)
            .create_async()
            .await;

        let settings = settings_for(server.url());
        assert_eq!(ServerBackends::new().fetch_active(&settings).await, None);
    }

    #[tokio::test]
    async fn malformed_or_empty_body_yields_none() {
        let mut server = Server::new_async().await;
        let settings = settings_for(server.url());

        let malformed = server
            .mock("GET", "/Sessions")
            .with_status(200)
            .with_body(r#"{"unexpected": true"#)
            .create_async()
            .await;
        assert_eq!(ServerBackends::new().fetch_active(&settings).await, None);
        malformed.remove_async().await;

        server
            .mock("GET", "/Sessions")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;
        assert_eq!(ServerBackends::new().fetch_active(&settings).await, None);
    }

    #[tokio::test]
    async fn missing_credentials_skip_the_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/Sessions")
            .expect(0)
            .create_async()
            .await;

        let mut settings = settings_for(server.url());
        settings.api_key = None;
        assert_eq!(ServerBackends::new().fetch_active(&settings).await, None);

        let settings = Settings {
            server_url: None,
            ..settings_for(server.url())
        };
        assert_eq!(ServerBackends::new().fetch_active(&settings).await, None);

        mock.assert_async().await;
    }
}
