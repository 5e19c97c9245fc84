//! Discord Rich Presence sink using discord-sdk

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use discord_sdk::{
    activity::{self as sdk, ActivityBuilder, Assets},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{PresenceError, Result};
use crate::presence::{
    ActivityEntry, ActivityKind, OutboundActivity, PresenceSink, ACTIVITY_FLAG_INSTANCE,
};

/// Timeout for waiting for Discord handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long shutdown waits for the final clear to reach Discord
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

enum SinkCommand {
    Update(Box<OutboundActivity>),
    Clear,
    Shutdown,
}

/// Publishes activities over Discord IPC from a background task
pub struct DiscordSink {
    update_tx: mpsc::UnboundedSender<SinkCommand>,
    /// What we last published; Discord IPC cannot report other applications
    current: Mutex<Option<OutboundActivity>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscordSink {
    /// Spawn the background task that owns the Discord connection
    pub fn init(application_id: i64) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(Self::run_discord_task(application_id, update_rx));

        Self {
            update_tx,
            current: Mutex::new(None),
            task: Mutex::new(Some(task)),
        }
    }

    /// Background task that maintains the Discord connection and processes presence updates
    async fn run_discord_task(
        application_id: i64,
        mut update_rx: mpsc::UnboundedReceiver<SinkCommand>,
    ) {
        let (wheel, handler) = Wheel::new(Box::new(|err| {
            tracing::warn!("Discord error: {:?}", err);
        }));

        let mut user_spoke = wheel.user();

        let discord = match Discord::new(application_id, Subscriptions::ACTIVITY, Box::new(handler))
        {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Discord not available: {:?}", e);
                return;
            }
        };

        tracing::info!("Discord connecting...");

        let user = match tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
            if user_spoke.0.changed().await.is_err() {
                Err("Discord connection closed".to_string())
            } else {
                match &*user_spoke.0.borrow() {
                    UserState::Connected(user) => Ok(user.clone()),
                    UserState::Disconnected(err) => Err(format!("Discord disconnected: {:?}", err)),
                }
            }
        })
        .await
        {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                tracing::warn!("{}", e);
                return;
            }
            Err(_) => {
                tracing::warn!("Discord handshake timed out");
                return;
            }
        };

        tracing::info!("Discord Rich Presence connected as {}", user.username);

        while let Some(command) = update_rx.recv().await {
            let result = match command {
                SinkCommand::Update(activity) => {
                    tracing::debug!(
                        "Setting Discord activity: {} / {} ({:?})",
                        activity.details,
                        activity.state,
                        activity.kind
                    );
                    discord
                        .update_activity(build_discord_activity(&activity))
                        .await
                        .map(|_| ())
                }
                SinkCommand::Clear => discord.clear_activity().await.map(|_| ()),
                SinkCommand::Shutdown => {
                    if let Err(e) = discord.clear_activity().await {
                        tracing::debug!("Failed to clear Discord activity: {:?}", e);
                    }
                    break;
                }
            };

            if let Err(e) = result {
                tracing::warn!("Failed to update Discord activity: {:?}", e);
            }
        }

        discord.disconnect().await;
        tracing::info!("Discord Rich Presence disconnected");
    }

    fn send(&self, command: SinkCommand) -> Result<()> {
        self.update_tx
            .send(command)
            .map_err(|_| PresenceError::Sink("Discord connection is closed".to_string()))
    }

    /// Clear the activity and close the connection
    pub async fn shutdown(&self) {
        if self.send(SinkCommand::Shutdown).is_err() {
            return;
        }

        let task = self.task.lock().unwrap().take();
        if let Some(task) = task {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
                tracing::warn!("Timed out waiting for Discord to disconnect");
            }
        }
    }
}

fn epoch_ms_to_system_time(ms: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

fn discord_kind(kind: ActivityKind) -> sdk::ActivityKind {
    match kind {
        ActivityKind::Listening => sdk::ActivityKind::Listening,
        ActivityKind::Watching => sdk::ActivityKind::Watching,
    }
}

fn build_discord_activity(activity: &OutboundActivity) -> ActivityBuilder {
    let mut builder = ActivityBuilder::new()
        .details(activity.details.clone())
        .state(activity.state.clone())
        .kind(discord_kind(activity.kind))
        .instance(activity.flags & ACTIVITY_FLAG_INSTANCE != 0);

    if let Some(assets) = &activity.assets {
        let mut discord_assets =
            Assets::default().large(assets.large_image.clone(), assets.large_text.clone());
        if let Some(small_image) = &assets.small_image {
            discord_assets = discord_assets.small(small_image.clone(), assets.small_text.clone());
        }
        builder = builder.assets(discord_assets);
    }

    if let Some(timestamps) = activity.timestamps {
        builder = builder
            .start_timestamp(epoch_ms_to_system_time(timestamps.start_ms))
            .end_timestamp(epoch_ms_to_system_time(timestamps.end_ms));
    }

    builder
}

#[async_trait]
impl PresenceSink for DiscordSink {
    fn name(&self) -> &'static str {
        "Discord"
    }

    async fn emit(&self, activity: Option<OutboundActivity>, channel_id: &str) -> Result<()> {
        tracing::debug!("Discord presence update on channel {}", channel_id);

        let command = match &activity {
            Some(activity) => SinkCommand::Update(Box::new(activity.clone())),
            None => SinkCommand::Clear,
        };
        self.send(command)?;

        *self.current.lock().unwrap() = activity;
        Ok(())
    }

    async fn current_activities(&self) -> Result<Vec<ActivityEntry>> {
        Ok(self
            .current
            .lock()
            .unwrap()
            .iter()
            .map(|activity| ActivityEntry {
                application_id: activity.application_id.clone(),
                name: Some(activity.name.clone()),
            })
            .collect())
    }
}
