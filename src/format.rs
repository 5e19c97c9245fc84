//! Turns [`MediaData`] into the text lines a presence displays

use crate::media::{non_zero, MediaData, MediaKind};
use crate::settings::{EpisodeFormat, Settings};

const STATE_SEPARATOR: &str = " • ";
const FALLBACK_STATE: &str = "Watching";

/// Episode label such as `S01E02`; empty unless both numbers are known
pub fn format_episode_label(
    season: Option<u32>,
    episode: Option<u32>,
    format: EpisodeFormat,
) -> String {
    let (Some(season), Some(episode)) = (non_zero(season), non_zero(episode)) else {
        return String::new();
    };

    match format {
        EpisodeFormat::Natural => format!("Season {} Episode {}", season, episode),
        EpisodeFormat::Short => format!("S{:02}E{:02}", season, episode),
        EpisodeFormat::Minimal => format!("{}x{:02}", season, episode),
    }
}

pub fn resolve_server_name(settings: &Settings) -> String {
    settings
        .custom_server_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| settings.backend.display_name())
        .to_string()
}

/// First line of the presence.
///
/// Episodes read `"{series} - {label}"`. The item title stands in when the
/// series name is missing, and the `" - "` suffix is dropped when the episode
/// label comes out empty. Audio uses the artist, then the album artist, then
/// the track title, followed by `" - {album}"` when an album is known.
pub fn build_details(media: &MediaData, settings: &Settings) -> String {
    match &media.kind {
        MediaKind::Episode {
            series,
            season,
            episode,
        } => {
            let series = series.as_deref().unwrap_or(&media.title);
            let label = format_episode_label(*season, *episode, settings.episode_format);
            if label.is_empty() {
                series.to_string()
            } else {
                format!("{} - {}", series, label)
            }
        }
        MediaKind::Audio {
            artist,
            album_artist,
            album_title,
        } => {
            let artist = artist
                .as_deref()
                .or(album_artist.as_deref())
                .unwrap_or(&media.title);
            match album_title {
                Some(album) => format!("{} - {}", artist, album),
                None => artist.to_string(),
            }
        }
        MediaKind::Movie => match media.year {
            Some(year) => format!("{} ({})", media.title, year),
            None => media.title.clone(),
        },
        MediaKind::Photo { photographer } => match photographer {
            Some(photographer) => format!("Viewing {}'s photo", photographer),
            None => "Viewing photo".to_string(),
        },
        MediaKind::Video | MediaKind::Unknown => media.title.clone(),
    }
}

/// Second line of the presence
pub fn build_state(media: &MediaData) -> String {
    let mut parts: Vec<String> = Vec::new();

    match &media.kind {
        MediaKind::Episode { .. } => parts.push(media.title.clone()),
        MediaKind::Audio {
            album_title: Some(album),
            ..
        } => parts.push(format!("from {}", album)),
        _ => {}
    }

    if parts.is_empty() {
        FALLBACK_STATE.to_string()
    } else {
        parts.join(STATE_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Backend;

    fn episode(title: &str, season: Option<u32>, episode: Option<u32>) -> MediaData {
        MediaData::new(
            title,
            MediaKind::Episode {
                series: Some("Severance".into()),
                season,
                episode,
            },
        )
    }

    fn track(album: Option<&str>) -> MediaData {
        MediaData::new(
            "Come Together",
            MediaKind::Audio {
                artist: Some("The Beatles".into()),
                album_artist: Some("The Beatles".into()),
                album_title: album.map(String::from),
            },
        )
    }

    #[test]
    fn episode_label_needs_both_numbers() {
        for format in [
            EpisodeFormat::Natural,
            EpisodeFormat::Short,
            EpisodeFormat::Minimal,
        ] {
            assert_eq!(format_episode_label(Some(0), Some(5), format), "");
            assert_eq!(format_episode_label(Some(1), Some(0), format), "");
            assert_eq!(format_episode_label(None, Some(5), format), "");
            assert_eq!(format_episode_label(Some(1), None, format), "");
        }
    }

    #[test]
    fn episode_label_formats() {
        assert_eq!(
            format_episode_label(Some(1), Some(2), EpisodeFormat::Natural),
            "Season 1 Episode 2"
        );
        assert_eq!(
            format_episode_label(Some(1), Some(2), EpisodeFormat::Short),
            "S01E02"
        );
        assert_eq!(
            format_episode_label(Some(1), Some(2), EpisodeFormat::Minimal),
            "1x02"
        );
        assert_eq!(
            format_episode_label(Some(12), Some(104), EpisodeFormat::Short),
            "S12E104"
        );
    }

    #[test]
    fn server_name_prefers_custom_name() {
        let mut settings = Settings::default();
        assert_eq!(resolve_server_name(&settings), "Jellyfin");
        settings.backend = Backend::Plex;
        assert_eq!(resolve_server_name(&settings), "Plex");
        settings.custom_server_name = Some("Basement NAS".into());
        assert_eq!(resolve_server_name(&settings), "Basement NAS");
        settings.custom_server_name = Some("  ".into());
        assert_eq!(resolve_server_name(&settings), "Plex");
    }

    #[test]
    fn details_per_type() {
        let settings = Settings {
            episode_format: EpisodeFormat::Short,
            ..Settings::default()
        };

        assert_eq!(
            build_details(&episode("Good News About Hell", Some(1), Some(1)), &settings),
            "Severance - S01E01"
        );
        assert_eq!(
            build_details(&episode("Special", None, None), &settings),
            "Severance"
        );
        assert_eq!(
            build_details(&track(Some("Abbey Road")), &settings),
            "The Beatles - Abbey Road"
        );
        assert_eq!(build_details(&track(None), &settings), "The Beatles");

        let mut movie = MediaData::new("Heat", MediaKind::Movie);
        assert_eq!(build_details(&movie, &settings), "Heat");
        movie.year = Some(1995);
        assert_eq!(build_details(&movie, &settings), "Heat (1995)");

        let photo = MediaData::new(
            "IMG_0001",
            MediaKind::Photo {
                photographer: Some("Ansel".into()),
            },
        );
        assert_eq!(build_details(&photo, &settings), "Viewing Ansel's photo");
        let anonymous = MediaData::new("IMG_0002", MediaKind::Photo { photographer: None });
        assert_eq!(build_details(&anonymous, &settings), "Viewing photo");

        let clip = MediaData::new("Trailer", MediaKind::Video);
        assert_eq!(build_details(&clip, &settings), "Trailer");
    }

    #[test]
    fn state_prepends_context() {
        assert_eq!(build_state(&episode("Pilot", Some(1), Some(1))), "Pilot");
        assert_eq!(build_state(&track(Some("Abbey Road"))), "from Abbey Road");
        assert_eq!(build_state(&track(None)), "Watching");
        assert_eq!(
            build_state(&MediaData::new("Heat", MediaKind::Movie)),
            "Watching"
        );
    }

    #[test]
    fn paused_media_keeps_its_state() {
        let mut pilot = episode("Pilot", Some(1), Some(1));
        pilot.is_paused = true;
        assert_eq!(build_state(&pilot), "Pilot");

        let mut movie = MediaData::new("Heat", MediaKind::Movie);
        movie.is_paused = true;
        assert_eq!(build_state(&movie), "Watching");
    }
}
