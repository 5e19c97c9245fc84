use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";
const SETTINGS_ENV: &str = "MEDIA_PRESENCE_SETTINGS";

pub const MIN_UPDATE_INTERVAL: u64 = 5;
pub const MAX_UPDATE_INTERVAL: u64 = 60;

/// Placeholder Discord application id. Users must replace it with the id of
/// their own Discord application via `application_id` in `settings.json`.
pub const DEFAULT_APPLICATION_ID: i64 = 1381368130164625469;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Jellyfin,
    Plex,
}

impl Backend {
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::Jellyfin => "Jellyfin",
            Backend::Plex => "Plex",
        }
    }

    /// Small image shown next to the artwork
    pub fn favicon_url(self) -> &'static str {
        match self {
            Backend::Jellyfin => "https://jellyfin.org/images/favicon.ico",
            Backend::Plex => "https://www.plex.tv/wp-content/themes/plex/assets/img/favicons/favicon.ico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeFormat {
    /// `Season 1 Episode 2`
    #[default]
    Natural,
    /// `S01E02`
    Short,
    /// `1x02`
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub episode_format: EpisodeFormat,
    pub show_timestamps: bool,
    pub custom_server_name: Option<String>,
    /// Seconds between polls
    pub update_interval: u64,
    pub hide_when_paused: bool,
    pub hide_when_other_activity: bool,
    pub application_id: i64,
    pub request_timeout_secs: u64,
    /// Token for Discord's external asset endpoint; URLs are passed through as-is without it
    pub asset_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Jellyfin,
            server_url: None,
            api_key: None,
            episode_format: EpisodeFormat::Natural,
            show_timestamps: true,
            custom_server_name: None,
            update_interval: 15,
            hide_when_paused: false,
            hide_when_other_activity: false,
            application_id: DEFAULT_APPLICATION_ID,
            request_timeout_secs: 10,
            asset_token: None,
        }
    }
}

impl Settings {
    /// Server URL without trailing slashes, if one is configured
    pub fn server_base(&self) -> Option<&str> {
        self.server_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.update_interval
                .clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn application_id_string(&self) -> String {
        self.application_id.to_string()
    }
}

/// Read-only access to the current settings
pub trait SettingsProvider: Send + Sync {
    fn snapshot(&self) -> Settings;
}

impl SettingsProvider for Settings {
    fn snapshot(&self) -> Settings {
        self.clone()
    }
}

/// Settings backed by a JSON file that is re-read on every snapshot
pub struct FileSettings {
    path: PathBuf,
    last_good: Mutex<Settings>,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        let initial = load_settings(&path).unwrap_or_else(|e| {
            tracing::warn!("{}, using defaults", e);
            Settings::default()
        });
        Self {
            path,
            last_good: Mutex::new(initial),
        }
    }

    pub fn from_default_location() -> Result<Self, String> {
        Ok(Self::new(get_settings_path()?))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SettingsProvider for FileSettings {
    fn snapshot(&self) -> Settings {
        let mut last_good = self
            .last_good
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match load_settings(&self.path) {
            Ok(settings) => {
                *last_good = settings.clone();
                settings
            }
            Err(e) => {
                tracing::warn!("{}, keeping previous settings", e);
                last_good.clone()
            }
        }
    }
}

pub fn get_settings_path() -> Result<PathBuf, String> {
    if let Ok(path) = std::env::var(SETTINGS_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir()
        .ok_or("Failed to get config directory")?
        .join("media-presence");

    fs::create_dir_all(&config_dir)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;

    Ok(config_dir.join(SETTINGS_FILE))
}

pub fn load_settings(path: &std::path::Path) -> Result<Settings, String> {
    tracing::debug!("Loading settings from {}", path.display());

    if !path.exists() {
        return Ok(Settings::default());
    }

    let contents =
        fs::read_to_string(path).map_err(|e| format!("Failed to read settings file: {}", e))?;

    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse settings: {}", e))
}

pub fn save_settings(path: &std::path::Path, settings: &Settings) -> Result<(), String> {
    tracing::debug!("Saving settings");

    let contents = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;

    fs::write(path, contents).map_err(|e| format!("Failed to write settings file: {}", e))
}
