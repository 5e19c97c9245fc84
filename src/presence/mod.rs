mod activity;
mod controller;
mod traits;

pub use activity::{
    activity_timestamps, ActivityAssets, ActivityEntry, ActivityKind, ActivityTimestamps,
    OutboundActivity, ACTIVITY_FLAG_INSTANCE, CHANNEL_ID,
};
pub use controller::PresenceController;
pub use traits::{AssetResolver, PresenceSink};
