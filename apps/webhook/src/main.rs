//! LINE webhook service: echoes text messages back to the sender and
//! archives image messages into a Google Drive folder.
//!
//! ```text
//! LINE POSTs deliveries to `/callback`; the signature is verified
//! against LINE_CHANNEL_SECRET, then each event is answered through
//! the Messaging API (and, for images, Drive).
//! ```

use std::sync::Arc;

use anyhow::Result;
use linedrop_drive::{HttpDriveClient, ServiceAccountKey, TokenProvider};
use linedrop_line::{HttpMessagingApi, MessagingApi};

use crate::config::Config;
use crate::handler::{AppState, StorageHandle};

mod config;
mod handler;
mod telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("linedrop-webhook")?;

    let config = Config::from_env()?;
    let http = reqwest::Client::new();

    let messaging: Arc<dyn MessagingApi> = Arc::new(HttpMessagingApi::new(
        http.clone(),
        config.channel_access_token.clone(),
        config.line_api_base.clone(),
        config.line_data_base.clone(),
    ));
    let storage = build_storage(&config, &http)?;
    if storage.is_none() {
        tracing::info!("drive upload disabled; running echo-only");
    }

    let state = AppState {
        channel_secret: config.channel_secret.clone(),
        messaging,
        storage,
    };
    let app = handler::router(state);

    tracing::info!("linedrop-webhook listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Wires the Drive client when both a destination folder and
/// credentials are present; anything less means echo-only mode.
fn build_storage(config: &Config, http: &reqwest::Client) -> Result<Option<StorageHandle>> {
    let Some(folder_id) = config.drive_folder_id.clone() else {
        if ServiceAccountKey::from_env()?.is_some() {
            tracing::warn!("google credentials set but DRIVE_FOLDER_ID missing");
        }
        return Ok(None);
    };

    let Some(key) = ServiceAccountKey::from_env()? else {
        tracing::warn!("DRIVE_FOLDER_ID set but no google credentials found");
        return Ok(None);
    };

    let tokens = TokenProvider::new(http.clone(), key);
    let drive = HttpDriveClient::new(http.clone(), tokens, config.drive_upload_base.clone());
    Ok(Some(StorageHandle {
        drive: Arc::new(drive),
        folder_id,
    }))
}
