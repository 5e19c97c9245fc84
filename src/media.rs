//! Backend-neutral model of whatever is currently playing

use serde::Serialize;

/// Coarse media type, the discriminant of [`MediaKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Episode,
    Audio,
    Video,
    Photo,
    Unknown,
}

/// Type-specific details. Fields only exist on the variant they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode {
        series: Option<String>,
        season: Option<u32>,
        episode: Option<u32>,
    },
    Audio {
        artist: Option<String>,
        album_artist: Option<String>,
        album_title: Option<String>,
    },
    Video,
    Photo {
        photographer: Option<String>,
    },
    Unknown,
}

impl MediaKind {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaKind::Movie => MediaType::Movie,
            MediaKind::Episode { .. } => MediaType::Episode,
            MediaKind::Audio { .. } => MediaType::Audio,
            MediaKind::Video => MediaType::Video,
            MediaKind::Photo { .. } => MediaType::Photo,
            MediaKind::Unknown => MediaType::Unknown,
        }
    }
}

/// A snapshot of the active session, built fresh on every poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaData {
    pub title: String,
    pub kind: MediaKind,
    pub is_paused: bool,
    /// Percentage in `0..=100`, absent when the duration is unknown
    pub progress: Option<u8>,
    pub duration_ms: Option<u64>,
    pub position_ms: Option<u64>,
    pub image_url: Option<String>,
    pub year: Option<i32>,
    pub studio: Option<String>,
}

impl MediaData {
    pub fn new(title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            title: title.into(),
            kind,
            is_paused: false,
            progress: None,
            duration_ms: None,
            position_ms: None,
            image_url: None,
            year: None,
            studio: None,
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.kind.media_type()
    }
}

/// Rounded playback percentage, or `None` when there is no usable duration.
///
/// Servers occasionally report a position past the end, so the result is
/// clamped rather than trusted.
pub fn progress_percent(position: u64, duration: Option<u64>) -> Option<u8> {
    let duration = duration.filter(|d| *d > 0)?;
    let percent = (position as f64 / duration as f64 * 100.0).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}

/// Treats zero as "not set", which is how both servers report missing indexes
pub(crate) fn non_zero(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

/// Drops empty strings so downstream formatting can rely on `Some` meaning text
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
