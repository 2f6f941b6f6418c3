//! Webhook payload model.
//!
//! Events arrive as a JSON array inside one delivery; payload order is
//! preserved as-is (the platform does not promise chronological
//! order). Unknown event or message kinds decode to catch-all
//! variants so one exotic event cannot fail the whole delivery.

use serde::Deserialize;

use crate::error::LineError;
use crate::signature::verify_signature;

/// One webhook delivery body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One webhook occurrence.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "message")]
    Message(MessageEvent),
    /// Follows, unfollows, joins and anything the platform adds later.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Single-use token the reply must be correlated with.
    pub reply_token: String,
    pub message: MessageContent,
}

/// Message body, tagged by kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum MessageContent {
    #[serde(rename = "text")]
    Text { id: String, text: String },
    /// The bytes are not inlined; `id` is fetched through the content
    /// API separately.
    #[serde(rename = "image")]
    Image { id: String },
    #[serde(other)]
    Other,
}

/// Verifies the delivery signature and decodes the event sequence.
///
/// Verification happens first on the raw bytes; a mismatch returns
/// [`LineError::InvalidSignature`] without attempting to parse.
pub fn parse_webhook(
    channel_secret: &str,
    body: &[u8],
    signature: &str,
) -> Result<Vec<Event>, LineError> {
    if !verify_signature(channel_secret, body, signature) {
        return Err(LineError::InvalidSignature);
    }
    let payload: WebhookPayload = serde_json::from_slice(body)?;
    Ok(payload.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn decodes_text_event() {
        let body = br#"{
            "destination": "U1",
            "events": [
                {
                    "type": "message",
                    "replyToken": "rt-1",
                    "message": { "type": "text", "id": "m-1", "text": "hello" }
                }
            ]
        }"#;
        let payload: WebhookPayload = serde_json::from_slice(body).unwrap();
        assert_eq!(payload.destination.as_deref(), Some("U1"));
        assert_eq!(payload.events.len(), 1);
        let Event::Message(event) = &payload.events[0] else {
            panic!("expected message event");
        };
        assert_eq!(event.reply_token, "rt-1");
        let MessageContent::Text { id, text } = &event.message else {
            panic!("expected text message");
        };
        assert_eq!(id, "m-1");
        assert_eq!(text, "hello");
    }

    #[test]
    fn decodes_image_event() {
        let body = br#"{
            "events": [
                {
                    "type": "message",
                    "replyToken": "rt-2",
                    "message": { "type": "image", "id": "img-9" }
                }
            ]
        }"#;
        let payload: WebhookPayload = serde_json::from_slice(body).unwrap();
        let Event::Message(event) = &payload.events[0] else {
            panic!("expected message event");
        };
        let MessageContent::Image { id } = &event.message else {
            panic!("expected image message");
        };
        assert_eq!(id, "img-9");
    }

    #[test]
    fn unknown_event_kinds_become_other() {
        let body = br#"{
            "events": [
                { "type": "follow", "replyToken": "rt-3" },
                {
                    "type": "message",
                    "replyToken": "rt-4",
                    "message": { "type": "sticker", "id": "s-1", "packageId": "p" }
                }
            ]
        }"#;
        let payload: WebhookPayload = serde_json::from_slice(body).unwrap();
        assert!(matches!(payload.events[0], Event::Other));
        let Event::Message(event) = &payload.events[1] else {
            panic!("expected message event");
        };
        assert!(matches!(event.message, MessageContent::Other));
    }

    #[test]
    fn preserves_payload_order() {
        let body = br#"{
            "events": [
                { "type": "message", "replyToken": "a", "message": { "type": "text", "id": "1", "text": "one" } },
                { "type": "message", "replyToken": "b", "message": { "type": "text", "id": "2", "text": "two" } },
                { "type": "message", "replyToken": "c", "message": { "type": "text", "id": "3", "text": "three" } }
            ]
        }"#;
        let payload: WebhookPayload = serde_json::from_slice(body).unwrap();
        let tokens: Vec<_> = payload
            .events
            .iter()
            .map(|event| match event {
                Event::Message(message) => message.reply_token.as_str(),
                Event::Other => "other",
            })
            .collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_webhook_accepts_signed_delivery() {
        let body = br#"{"events":[]}"#;
        let signature = sign("secret", body);
        let events = parse_webhook("secret", body, &signature).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn parse_webhook_rejects_bad_signature_before_parsing() {
        // Body is not even JSON; the signature check must fail first.
        let err = parse_webhook("secret", b"not json", "bm90LXZhbGlk").unwrap_err();
        assert!(matches!(err, LineError::InvalidSignature));
    }

    #[test]
    fn parse_webhook_flags_malformed_payload() {
        let body = b"not json";
        let signature = sign("secret", body);
        let err = parse_webhook("secret", body, &signature).unwrap_err();
        assert!(matches!(err, LineError::MalformedPayload(_)));
    }
}
