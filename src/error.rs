use thiserror::Error;

/// Everything that can go wrong during one poll cycle.
///
/// None of these are fatal: adapters turn them into "no session" and the
/// controller turns them into a cleared presence.
#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("server URL or API key is not configured")]
    ConfigIncomplete,

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to resolve asset {url}: {reason}")]
    AssetResolution { url: String, reason: String },

    #[error("presence sink rejected update: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, PresenceError>;
