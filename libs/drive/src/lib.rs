//! Google Drive adapter.
//!
//! Authenticates with a service-account key (JWT bearer grant) and
//! uploads files into a fixed destination folder via the Drive v3
//! multipart endpoint.

mod auth;
mod client;
mod creds;
mod error;

pub use auth::TokenProvider;
pub use client::{DriveApi, HttpDriveClient};
pub use creds::ServiceAccountKey;
pub use error::DriveError;
