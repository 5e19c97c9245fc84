mod assets;
mod presence;

pub use assets::{DirectAssets, ExternalAssets};
pub use presence::DiscordSink;
