use thiserror::Error;

/// Errors surfaced by the LINE adapter.
#[derive(Debug, Error)]
pub enum LineError {
    /// The `X-Line-Signature` header does not match the request body.
    #[error("webhook signature mismatch")]
    InvalidSignature,

    /// The body passed verification but is not a webhook payload we
    /// can decode.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The Messaging API answered with a non-success status.
    #[error("line api returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure talking to the Messaging API.
    #[error("line api transport error: {0}")]
    Net(#[from] reqwest::Error),
}
