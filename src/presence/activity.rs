use serde::Serialize;

use crate::media::{MediaData, MediaKind, MediaType};

/// Scopes this program's updates so unrelated presences are left alone
pub const CHANNEL_ID: &str = "media-presence";

/// Discord's "instance" activity flag
pub const ACTIVITY_FLAG_INSTANCE: u32 = 1 << 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Listening,
    Watching,
}

impl ActivityKind {
    pub fn for_media(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Audio => ActivityKind::Listening,
            _ => ActivityKind::Watching,
        }
    }

    /// Numeric activity type as Discord expects it
    pub fn code(self) -> u8 {
        match self {
            ActivityKind::Listening => 2,
            ActivityKind::Watching => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityAssets {
    pub large_image: String,
    pub large_text: Option<String>,
    pub small_image: Option<String>,
    pub small_text: Option<String>,
}

/// Unix epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityTimestamps {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// The payload handed to a [`PresenceSink`](super::PresenceSink), built per poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundActivity {
    pub application_id: String,
    pub name: String,
    pub details: String,
    pub state: String,
    pub assets: Option<ActivityAssets>,
    pub timestamps: Option<ActivityTimestamps>,
    pub kind: ActivityKind,
    pub flags: u32,
}

/// Another application's activity as reported by the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub application_id: String,
    pub name: Option<String>,
}

/// Start/end so the consumer can render elapsed and remaining time.
///
/// Only produced when the duration is known and non-zero. A position past the
/// end yields an end time in the past rather than an error.
pub fn activity_timestamps(now_ms: i64, media: &MediaData) -> Option<ActivityTimestamps> {
    let duration = media.duration_ms.filter(|d| *d > 0)?;
    let duration = i64::try_from(duration).unwrap_or(i64::MAX);
    let position = i64::try_from(media.position_ms.unwrap_or(0)).unwrap_or(i64::MAX);

    Some(ActivityTimestamps {
        start_ms: now_ms.saturating_sub(position),
        end_ms: now_ms.saturating_add(duration.saturating_sub(position)),
    })
}

/// Hover text for the artwork
pub fn large_image_text(media: &MediaData) -> String {
    match &media.kind {
        MediaKind::Audio {
            album_title: Some(album),
            ..
        } => album.clone(),
        _ => media.title.clone(),
    }
}
