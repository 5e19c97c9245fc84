use serde::Deserialize;

use super::{encode_query_value, get_json, normalize_type, require_connection};
use crate::error::Result;
use crate::media::{non_empty, non_zero, progress_percent, MediaData, MediaKind};
use crate::settings::Settings;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionsResponse {
    media_container: MediaContainer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MediaContainer {
    #[serde(default)]
    metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    grandparent_title: Option<String>,
    parent_title: Option<String>,
    original_title: Option<String>,
    parent_index: Option<u32>,
    index: Option<u32>,
    year: Option<i32>,
    studio: Option<String>,
    duration: Option<u64>,
    view_offset: Option<u64>,
    thumb: Option<String>,
    #[serde(rename = "Player")]
    player: Option<Player>,
}

#[derive(Debug, Deserialize)]
struct Player {
    state: Option<String>,
}

pub(super) async fn fetch_now_playing(
    client: &reqwest::Client,
    settings: &Settings,
) -> Result<Option<MediaData>> {
    let (base, token) = require_connection(settings)?;

    let request = client
        .get(format!("{}/status/sessions", base))
        .header("X-Plex-Token", token)
        .header(reqwest::header::ACCEPT, "application/json")
        .timeout(settings.request_timeout());
    let response: SessionsResponse = get_json(request).await?;

    Ok(response
        .media_container
        .metadata
        .into_iter()
        .next()
        .map(|metadata| map_metadata(base, token, metadata)))
}

fn map_kind(metadata: &Metadata) -> MediaKind {
    match normalize_type(metadata.kind.as_deref()).as_str() {
        "movie" => MediaKind::Movie,
        "episode" => MediaKind::Episode {
            series: non_empty(metadata.grandparent_title.clone()),
            season: non_zero(metadata.parent_index),
            episode: non_zero(metadata.index),
        },
        "track" => MediaKind::Audio {
            artist: non_empty(metadata.original_title.clone())
                .or_else(|| non_empty(metadata.grandparent_title.clone())),
            album_artist: non_empty(metadata.grandparent_title.clone()),
            album_title: non_empty(metadata.parent_title.clone()),
        },
        "photo" => MediaKind::Photo {
            photographer: non_empty(metadata.original_title.clone()),
        },
        "clip" => MediaKind::Video,
        _ => MediaKind::Unknown,
    }
}

/// Artwork URL from the relative `thumb` path
fn thumb_url(base: &str, token: &str, thumb: &str) -> String {
    let separator = if thumb.contains('?') { '&' } else { '?' };
    let path = if thumb.starts_with("http://") || thumb.starts_with("https://") {
        thumb.to_string()
    } else if thumb.starts_with('/') {
        format!("{}{}", base, thumb)
    } else {
        format!("{}/{}", base, thumb)
    };
    format!(
        "{}{}X-Plex-Token={}",
        path,
        separator,
        encode_query_value(token)
    )
}

fn map_metadata(base: &str, token: &str, metadata: Metadata) -> MediaData {
    let is_paused = metadata
        .player
        .as_ref()
        .and_then(|player| player.state.as_deref())
        != Some("playing");

    MediaData {
        title: metadata.title.clone().unwrap_or_default(),
        kind: map_kind(&metadata),
        is_paused,
        progress: progress_percent(metadata.view_offset.unwrap_or(0), metadata.duration),
        duration_ms: metadata.duration,
        position_ms: metadata.view_offset,
        image_url: metadata
            .thumb
            .as_deref()
            .filter(|thumb| !thumb.is_empty())
            .map(|thumb| thumb_url(base, token, thumb)),
        year: metadata.year,
        studio: non_empty(metadata.studio),
    }
}
