//! Drives the poll → decide → format → emit cycle on a timer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::activity::{
    activity_timestamps, large_image_text, ActivityAssets, ActivityKind, OutboundActivity,
    ACTIVITY_FLAG_INSTANCE, CHANNEL_ID,
};
use super::traits::{AssetResolver, PresenceSink};
use crate::backends::MediaSource;
use crate::error::Result;
use crate::format::{build_details, build_state, resolve_server_name};
use crate::media::MediaData;
use crate::settings::{Settings, SettingsProvider};

/// Owns the polling timer and the collaborators each poll needs.
///
/// `start` and `stop` are expected to be paired; a second `start` while
/// active is ignored.
pub struct PresenceController {
    context: Arc<PollContext>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

struct PollContext {
    settings: Arc<dyn SettingsProvider>,
    source: Arc<dyn MediaSource>,
    sink: Arc<dyn PresenceSink>,
    assets: Arc<dyn AssetResolver>,
    /// Bumped by `stop` so polls that started earlier drop their result
    generation: AtomicU64,
    /// Serializes emissions with the generation check
    emit_lock: tokio::sync::Mutex<()>,
}

impl PresenceController {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        source: Arc<dyn MediaSource>,
        sink: Arc<dyn PresenceSink>,
        assets: Arc<dyn AssetResolver>,
    ) -> Self {
        Self {
            context: Arc::new(PollContext {
                settings,
                source,
                sink,
                assets,
                generation: AtomicU64::new(0),
                emit_lock: tokio::sync::Mutex::new(()),
            }),
            timer: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.lock().unwrap().is_some()
    }

    /// Poll once right away, then on every interval tick
    pub async fn start(&self) {
        if self.is_active() {
            tracing::warn!("Presence controller already running, ignoring start");
            return;
        }

        let generation = self.context.generation.load(Ordering::SeqCst);
        self.context.poll(generation).await;

        let interval = self.context.settings.snapshot().poll_interval();
        tracing::info!(
            "Presence controller started via {}, polling every {}s",
            self.context.sink.name(),
            interval.as_secs()
        );

        let context = Arc::clone(&self.context);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // Each tick gets its own task so a hung server never delays the next one
                let context = Arc::clone(&context);
                tokio::spawn(async move {
                    context.poll(generation).await;
                });
            }
        });

        let previous = self.timer.lock().unwrap().replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stop future ticks and clear the presence.
    ///
    /// Polls already in flight keep running but can no longer emit once this
    /// returns.
    pub async fn stop(&self) {
        let handle = self.timer.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("Presence controller stopped");
        }

        let _guard = self.context.emit_lock.lock().await;
        self.context.generation.fetch_add(1, Ordering::SeqCst);
        self.context.send(None).await;
    }

    /// Run a single poll cycle outside the timer
    pub async fn poll(&self) {
        let generation = self.context.generation.load(Ordering::SeqCst);
        self.context.poll(generation).await;
    }

    pub async fn clear_presence(&self) {
        let _guard = self.context.emit_lock.lock().await;
        self.context.send(None).await;
    }
}

impl PollContext {
    async fn poll(&self, generation: u64) {
        let activity = match self.build_activity().await {
            Ok(activity) => activity,
            Err(e) => {
                tracing::error!("Failed to build presence: {}", e);
                None
            }
        };

        let _guard = self.emit_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Dropping result of a poll that outlived stop");
            return;
        }
        self.send(activity).await;
    }

    /// Emit, falling back to a clear if the sink rejects an update
    async fn send(&self, activity: Option<OutboundActivity>) {
        let is_update = activity.is_some();
        match self.sink.emit(activity, CHANNEL_ID).await {
            Ok(()) => {}
            Err(e) if is_update => {
                tracing::error!("Failed to update {} presence: {}", self.sink.name(), e);
                if let Err(e) = self.sink.emit(None, CHANNEL_ID).await {
                    tracing::error!("Failed to clear {} presence: {}", self.sink.name(), e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to clear {} presence: {}", self.sink.name(), e);
            }
        }
    }

    /// `Ok(None)` means "clear": nothing playing, or suppressed
    async fn build_activity(&self) -> Result<Option<OutboundActivity>> {
        let settings = self.settings.snapshot();

        let Some(media) = self.source.fetch_active(&settings).await else {
            tracing::debug!("No active session");
            return Ok(None);
        };

        if media.is_paused && settings.hide_when_paused {
            tracing::debug!("Hiding paused session: {}", media.title);
            return Ok(None);
        }

        let application_id = settings.application_id_string();

        if settings.hide_when_other_activity {
            let activities = self.sink.current_activities().await?;
            if let Some(other) = activities
                .iter()
                .find(|activity| activity.application_id != application_id)
            {
                tracing::debug!(
                    "Hiding presence, another activity is showing: {}",
                    other.name.as_deref().unwrap_or(&other.application_id)
                );
                return Ok(None);
            }
        }

        let details = build_details(&media, &settings);
        let state = build_state(&media);

        let timestamps = if settings.show_timestamps {
            activity_timestamps(chrono::Utc::now().timestamp_millis(), &media)
        } else {
            None
        };

        let assets = match media.image_url.as_deref() {
            Some(image_url) => Some(
                self.resolve_assets(&application_id, image_url, &media, &settings)
                    .await?,
            ),
            None => None,
        };

        Ok(Some(OutboundActivity {
            application_id,
            name: resolve_server_name(&settings),
            details,
            state,
            assets,
            timestamps,
            kind: ActivityKind::for_media(media.media_type()),
            flags: ACTIVITY_FLAG_INSTANCE,
        }))
    }

    async fn resolve_assets(
        &self,
        application_id: &str,
        image_url: &str,
        media: &MediaData,
        settings: &Settings,
    ) -> Result<ActivityAssets> {
        let (large_image, small_image) = tokio::try_join!(
            self.assets.resolve(application_id, image_url),
            self.assets
                .resolve(application_id, settings.backend.favicon_url()),
        )?;

        Ok(ActivityAssets {
            large_image,
            large_text: Some(large_image_text(media)),
            small_image: Some(small_image),
            small_text: Some(resolve_server_name(settings)),
        })
    }
}
