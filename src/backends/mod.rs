//! Media server adapters
//!
//! Each adapter fetches the server's session list and maps the first active
//! session onto [`MediaData`]. Adapters never fail outward: errors are logged
//! and reported as "nothing playing".

mod jellyfin;
mod plex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{PresenceError, Result};
use crate::media::MediaData;
use crate::settings::{Backend, Settings};

/// Anything that can report the currently playing media
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Returns the active session, or `None` if nothing is playing or the
    /// server could not be queried
    async fn fetch_active(&self, settings: &Settings) -> Option<MediaData>;
}

/// Dispatches to the Jellyfin or Plex adapter according to the settings
pub struct ServerBackends {
    client: reqwest::Client,
}

impl ServerBackends {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ServerBackends {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for ServerBackends {
    async fn fetch_active(&self, settings: &Settings) -> Option<MediaData> {
        let backend = settings.backend;
        let result = match backend {
            Backend::Jellyfin => jellyfin::fetch_now_playing(&self.client, settings).await,
            Backend::Plex => plex::fetch_now_playing(&self.client, settings).await,
        };

        match result {
            Ok(media) => media,
            Err(PresenceError::ConfigIncomplete) => {
                tracing::debug!("{} is not configured, skipping", backend.display_name());
                None
            }
            Err(e) => {
                tracing::error!(
                    "Failed to fetch {} sessions: {}",
                    backend.display_name(),
                    e
                );
                None
            }
        }
    }
}

/// Server URL and credential, or `ConfigIncomplete`
fn require_connection(settings: &Settings) -> Result<(&str, &str)> {
    match (settings.server_base(), settings.credential()) {
        (Some(base), Some(key)) => Ok((base, key)),
        _ => Err(PresenceError::ConfigIncomplete),
    }
}

/// Sends the request and decodes a JSON body.
///
/// The body is read as text first so a malformed payload surfaces as
/// `Parse` rather than a transport error.
async fn get_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(PresenceError::Status(response.status()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Case-insensitive lookup shared by both adapters
fn normalize_type(raw: Option<&str>) -> String {
    raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default()
}
