//! Image URL → asset id resolution for Discord activities

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, Result};
use crate::presence::AssetResolver;

const DISCORD_API_BASE: &str = "https://discord.com/api/v9";

/// Registered URLs kept in memory; older entries are evicted first
const MAX_CACHED_ASSETS: usize = 64;

/// Hands the URL straight to Discord, which accepts `http(s)` image keys
pub struct DirectAssets;

#[async_trait]
impl AssetResolver for DirectAssets {
    async fn resolve(&self, _application_id: &str, url: &str) -> Result<String> {
        Ok(url.to_string())
    }
}

#[derive(Serialize)]
struct ExternalAssetsRequest<'a> {
    urls: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ExternalAsset {
    url: String,
    external_asset_path: String,
}

/// Bounded URL → asset id map
#[derive(Default)]
struct AssetCache {
    ids: HashMap<String, String>,
    order: VecDeque<String>,
}

impl AssetCache {
    fn get(&self, url: &str) -> Option<String> {
        self.ids.get(url).cloned()
    }

    fn insert(&mut self, url: String, asset_id: String) {
        if self.ids.insert(url.clone(), asset_id).is_none() {
            self.order.push_back(url);
        }
        while self.order.len() > MAX_CACHED_ASSETS {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Registers URLs through Discord's external asset proxy and caches the ids
pub struct ExternalAssets {
    client: reqwest::Client,
    token: String,
    api_base: String,
    timeout: Duration,
    cache: Mutex<AssetCache>,
}

impl ExternalAssets {
    pub fn new(client: reqwest::Client, token: String, timeout: Duration) -> Self {
        Self::with_api_base(client, token, DISCORD_API_BASE.to_string(), timeout)
    }

    pub fn with_api_base(
        client: reqwest::Client,
        token: String,
        api_base: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            token,
            api_base,
            timeout,
            cache: Mutex::new(AssetCache::default()),
        }
    }

    async fn register(&self, application_id: &str, url: &str) -> Result<String> {
        let failure = |reason: String| PresenceError::AssetResolution {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .post(format!(
                "{}/applications/{}/external-assets",
                self.api_base, application_id
            ))
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .timeout(self.timeout)
            .json(&ExternalAssetsRequest { urls: [url] })
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failure(format!("status {}", response.status())));
        }

        let assets: Vec<ExternalAsset> = response
            .json()
            .await
            .map_err(|e| failure(format!("unexpected response: {}", e)))?;

        let asset = assets
            .into_iter()
            .find(|asset| asset.url == url)
            .ok_or_else(|| failure("no asset returned".to_string()))?;

        Ok(format!("mp:{}", asset.external_asset_path))
    }
}

#[async_trait]
impl AssetResolver for ExternalAssets {
    async fn resolve(&self, application_id: &str, url: &str) -> Result<String> {
        let cached = self.cache.lock().unwrap().get(url);
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let asset_id = self.register(application_id, url).await?;
        tracing::debug!("Registered external asset for {}", url);

        self.cache
            .lock()
            .unwrap()
            .insert(url.to_string(), asset_id.clone());
        Ok(asset_id)
    }
}
