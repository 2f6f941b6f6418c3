//! Webhook endpoint and per-event responder.
//!
//! `POST /callback` verifies the delivery signature, then walks the
//! event sequence in payload order. Upstream-call failures are caught
//! per event so one bad event never blocks its siblings; the chat user
//! is never shown an error, the request just answers 500.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use linedrop_drive::DriveApi;
use linedrop_line::{Event, LineError, MessageContent, MessageEvent, MessagingApi, parse_webhook};

pub const SIGNATURE_HEADER: &str = "X-Line-Signature";

const LIVENESS_BODY: &str = "linedrop is alive";
const IMAGE_SAVED_REPLY: &str = "画像を保存しました！（ID: {id}）";
const IMAGE_ACK_REPLY: &str = "画像を受け取りました！";

#[derive(Clone)]
pub struct AppState {
    pub channel_secret: String,
    pub messaging: Arc<dyn MessagingApi>,
    pub storage: Option<StorageHandle>,
}

/// Drive client plus the destination folder it writes into. Built once
/// at startup and shared read-only across requests.
#[derive(Clone)]
pub struct StorageHandle {
    pub drive: Arc<dyn DriveApi>,
    pub folder_id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/callback", post(callback))
        .with_state(state)
}

async fn index() -> &'static str {
    LIVENESS_BODY
}

async fn callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let events = match parse_webhook(&state.channel_secret, &body, signature) {
        Ok(events) => events,
        Err(LineError::InvalidSignature) => {
            tracing::warn!("invalid webhook signature");
            return StatusCode::BAD_REQUEST.into_response();
        }
        Err(err) => {
            tracing::warn!(error = %err, "undecodable webhook payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut failed = false;
    for event in events {
        let Event::Message(message) = event else {
            continue;
        };
        let reply_token = message.reply_token.clone();
        if let Err(err) = respond(&state, message).await {
            tracing::error!(reply_token = %reply_token, error = %err, "event handling failed");
            failed = true;
        }
    }

    if failed {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    } else {
        (StatusCode::OK, "OK").into_response()
    }
}

async fn respond(state: &AppState, event: MessageEvent) -> anyhow::Result<()> {
    match event.message {
        // Verbatim echo, including empty and whitespace-only strings.
        MessageContent::Text { text, .. } => {
            state.messaging.reply(&event.reply_token, &text).await?;
        }
        MessageContent::Image { id } => match &state.storage {
            Some(storage) => {
                let bytes = state.messaging.get_content(&id).await?;
                let size = bytes.len();
                let filename = format!("{id}.jpg");
                let file_id = storage
                    .drive
                    .upload(bytes, &filename, &storage.folder_id)
                    .await?;
                tracing::info!(message_id = %id, %file_id, size, "image archived");
                state
                    .messaging
                    .reply(&event.reply_token, &IMAGE_SAVED_REPLY.replace("{id}", &file_id))
                    .await?;
            }
            None => {
                state.messaging.reply(&event.reply_token, IMAGE_ACK_REPLY).await?;
            }
        },
        MessageContent::Other => {}
    }
    Ok(())
}
