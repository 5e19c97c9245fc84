pub mod backends;
pub mod discord;
pub mod error;
pub mod format;
pub mod logging;
pub mod media;
pub mod presence;
pub mod settings;

use std::sync::Arc;

use backends::ServerBackends;
use discord::{DirectAssets, DiscordSink, ExternalAssets};
use presence::{AssetResolver, PresenceController};
use settings::{FileSettings, SettingsProvider};

/// Run until Ctrl-C, mirroring the configured media server into Discord
pub async fn run() -> Result<(), String> {
    let _guard = logging::init_logging();

    let settings = Arc::new(FileSettings::from_default_location()?);
    tracing::info!("Using settings file {}", settings.path().display());

    let snapshot = settings.snapshot();
    tracing::info!(
        "Watching {} at {}",
        snapshot.backend.display_name(),
        snapshot.server_base().unwrap_or("<not configured>")
    );

    let client = reqwest::Client::new();

    let assets: Arc<dyn AssetResolver> = match snapshot.asset_token.clone() {
        Some(token) => Arc::new(ExternalAssets::new(
            client.clone(),
            token,
            snapshot.request_timeout(),
        )),
        None => Arc::new(DirectAssets),
    };

    let sink = Arc::new(DiscordSink::init(snapshot.application_id));

    let controller = PresenceController::new(
        settings,
        Arc::new(ServerBackends::with_client(client)),
        sink.clone(),
        assets,
    );

    controller.start().await;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for shutdown signal: {}", e))?;

    tracing::info!("Shutting down");
    controller.stop().await;
    sink.shutdown().await;

    Ok(())
}
