//! Webhook signature verification.
//!
//! LINE signs each delivery with base64(HMAC-SHA256(channel_secret,
//! raw body)) and sends the digest in `X-Line-Signature`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a webhook delivery against the channel secret.
///
/// Operates on the raw body bytes exactly as received; any
/// re-serialization would break the digest.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    if signature.is_empty() {
        return false;
    }

    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = BASE64.encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}
