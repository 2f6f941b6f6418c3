//! Outbound Messaging API client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;

use crate::error::LineError;

pub const DEFAULT_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_DATA_BASE: &str = "https://api-data.line.me";

const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// The two Messaging API calls the responder consumes.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Sends one text message correlated to a reply token. The token
    /// is single-use; the platform rejects a second reply.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), LineError>;

    /// Downloads the full binary content behind a message id. All
    /// bytes are buffered before returning.
    async fn get_content(&self, message_id: &str) -> Result<Bytes, LineError>;
}

#[derive(Clone)]
pub struct HttpMessagingApi {
    http: Client,
    channel_access_token: String,
    api_base: String,
    data_base: String,
}

impl HttpMessagingApi {
    pub fn new(
        http: Client,
        channel_access_token: impl Into<String>,
        api_base: Option<String>,
        data_base: Option<String>,
    ) -> Self {
        Self {
            http,
            channel_access_token: channel_access_token.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.into()),
            data_base: data_base.unwrap_or_else(|| DEFAULT_DATA_BASE.into()),
        }
    }

    fn reply_url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.api_base.trim_end_matches('/'))
    }

    fn content_url(&self, message_id: &str) -> String {
        format!(
            "{}/v2/bot/message/{}/content",
            self.data_base.trim_end_matches('/'),
            message_id
        )
    }
}

#[async_trait]
impl MessagingApi for HttpMessagingApi {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), LineError> {
        let payload = json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });

        let response = self
            .http
            .post(self.reply_url())
            .bearer_auth(&self.channel_access_token)
            .timeout(CALL_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn get_content(&self, message_id: &str) -> Result<Bytes, LineError> {
        let response = self
            .http
            .get(self.content_url(message_id))
            .bearer_auth(&self.channel_access_token)
            .timeout(CALL_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::Api {
                status: status.as_u16(),
                body,
            });
        }
        // reqwest concatenates the chunked transfer into one buffer.
        let bytes = response.bytes().await?;
        tracing::debug!(message_id, size = bytes.len(), "fetched message content");
        Ok(bytes)
    }
}
