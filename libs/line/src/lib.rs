//! LINE Messaging API adapter.
//!
//! Covers the three platform touchpoints the webhook service needs:
//! signature verification of inbound callbacks, the webhook event
//! model, and the outbound reply / content-download calls.

mod error;
mod messaging;
mod signature;
mod webhook;

pub use error::LineError;
pub use messaging::{HttpMessagingApi, MessagingApi};
pub use signature::verify_signature;
pub use webhook::{parse_webhook, Event, MessageContent, MessageEvent, WebhookPayload};
