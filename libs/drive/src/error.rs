use thiserror::Error;

/// Errors surfaced by the Drive adapter.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Neither credential source is present in the environment.
    #[error("no google credentials configured")]
    MissingCredentials,

    /// The credential blob or file could not be decoded.
    #[error("invalid service account key: {0}")]
    InvalidCredentials(String),

    /// Signing the token-exchange assertion failed.
    #[error("jwt assertion error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint or upload endpoint answered non-success.
    #[error("google api returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure.
    #[error("google api transport error: {0}")]
    Net(#[from] reqwest::Error),

    /// The upload succeeded but the response carried no file id.
    #[error("upload response missing file id")]
    MissingFileId,
}
