//! Service-account token exchange.
//!
//! Mints an access token with the OAuth JWT-bearer grant: sign an
//! RS256 assertion with the key's private key, trade it at the token
//! endpoint, cache the result until shortly before expiry.

use std::sync::Mutex;
use std::time::Duration as StdDuration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::creds::ServiceAccountKey;
use crate::error::DriveError;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL: Duration = Duration::hours(1);
// Refresh slightly early so an in-flight upload never carries a token
// that expires mid-request.
const EXPIRY_MARGIN: Duration = Duration::seconds(60);
const CALL_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Mints and caches access tokens for one service account.
pub struct TokenProvider {
    http: Client,
    key: ServiceAccountKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: Client, key: ServiceAccountKey) -> Self {
        Self {
            http,
            key,
            cached: Mutex::new(None),
        }
    }

    /// Returns a token valid for at least [`EXPIRY_MARGIN`] more.
    pub async fn access_token(&self) -> Result<String, DriveError> {
        let now = OffsetDateTime::now_utc();
        if let Some(cached) = self.fresh_token(now) {
            return Ok(cached);
        }

        tracing::debug!(client_email = %self.key.client_email, "minting drive access token");
        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .timeout(CALL_TIMEOUT)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
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

        let token: TokenResponse = response.json().await?;
        let cached = CachedToken {
            token: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        };
        *self.cached.lock().expect("token cache poisoned") = Some(cached);
        Ok(token.access_token)
    }

    fn fresh_token(&self, now: OffsetDateTime) -> Option<String> {
        let cached = self.cached.lock().expect("token cache poisoned");
        cached
            .as_ref()
            .filter(|token| token.is_fresh(now))
            .map(|token| token.token.clone())
    }

    fn sign_assertion(&self, now: OffsetDateTime) -> Result<String, DriveError> {
        let claims = assertion_claims(&self.key, now);
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }
}

fn assertion_claims(key: &ServiceAccountKey, now: OffsetDateTime) -> AssertionClaims {
    AssertionClaims {
        iss: key.client_email.clone(),
        scope: DRIVE_SCOPE.into(),
        aud: key.token_uri.clone(),
        iat: now.unix_timestamp(),
        exp: (now + ASSERTION_TTL).unix_timestamp(),
    }
}
