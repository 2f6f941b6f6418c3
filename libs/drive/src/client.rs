//! Drive v3 upload client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::error::DriveError;

pub const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com";

const CALL_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_MIME: &str = "image/jpeg";

/// The single Drive call the responder consumes.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Stores `bytes` as `filename` inside `folder_id` and returns the
    /// opaque file id Drive assigned.
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        folder_id: &str,
    ) -> Result<String, DriveError>;
}

pub struct HttpDriveClient {
    http: Client,
    tokens: TokenProvider,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    #[serde(default)]
    id: Option<String>,
}

impl HttpDriveClient {
    pub fn new(http: Client, tokens: TokenProvider, upload_base: Option<String>) -> Self {
        Self {
            http,
            tokens,
            upload_base: upload_base.unwrap_or_else(|| DEFAULT_UPLOAD_BASE.into()),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id",
            self.upload_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl DriveApi for HttpDriveClient {
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        folder_id: &str,
    ) -> Result<String, DriveError> {
        let token = self.tokens.access_token().await?;
        tracing::debug!(filename, folder_id, size = bytes.len(), "uploading to drive");
        let metadata = json!({
            "name": filename,
            "parents": [folder_id],
            "mimeType": UPLOAD_MIME,
        });
        let boundary = format!("linedrop-{}", Uuid::new_v4().simple());
        let body = multipart_related(&metadata, &bytes, &boundary);

        let response = self
            .http
            .post(self.upload_url())
            .bearer_auth(token)
            .timeout(CALL_TIMEOUT)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let file: DriveFile = response.json().await?;
        file.id.ok_or(DriveError::MissingFileId)
    }
}

/// Assembles the `multipart/related` body the Drive multipart endpoint
/// expects: a JSON metadata part followed by the raw media part. The
/// media bytes go in untouched.
fn multipart_related(metadata: &serde_json::Value, media: &[u8], boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {UPLOAD_MIME}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
