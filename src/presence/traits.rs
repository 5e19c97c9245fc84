use async_trait::async_trait;

use super::activity::{ActivityEntry, OutboundActivity};
use crate::error::Result;

/// Trait for presence consumers (Discord, test recorders, ...)
#[async_trait]
pub trait PresenceSink: Send + Sync {
    /// Returns the name of this sink (for logging)
    fn name(&self) -> &'static str;

    /// Publish an activity, or clear ours when `activity` is `None`.
    ///
    /// `channel_id` scopes the update so other presences are untouched.
    async fn emit(&self, activity: Option<OutboundActivity>, channel_id: &str) -> Result<()>;

    /// Activities currently shown for the user
    async fn current_activities(&self) -> Result<Vec<ActivityEntry>>;
}

/// Turns an image URL into an id the presence consumer can display
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, application_id: &str, url: &str) -> Result<String>;
}
