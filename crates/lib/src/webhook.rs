//! Inbound webhook payload types (WhatsApp Business Account events).
//!
//! Shapes are kept permissive: unknown change fields fall through to a catch-all
//! variant and message items stay raw JSON so one malformed item cannot abort
//! its siblings.

use serde::Deserialize;
use serde_json::Value;

/// `object` tag of events from a WhatsApp business account; anything else is ignored.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

/// Top-level webhook payload.
#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    #[serde(default)]
    pub object: String,
    /// `None` when the payload carries no entry list at all (malformed or foreign).
    #[serde(default)]
    pub entry: Option<Vec<InboundEntry>>,
}

/// One logical unit of change within an event.
#[derive(Debug, Deserialize)]
pub struct InboundEntry {
    #[serde(default)]
    pub changes: Vec<InboundChange>,
}

/// One change, keyed by `field`. Unknown fields land in `Other` and are
/// silently skipped by the dispatcher.
#[derive(Debug, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum InboundChange {
    Messages(MessagesPayload),
    MessageStatuses(StatusesPayload),
    #[serde(untagged)]
    Other(Value),
}

/// `value` of a `messages` change. Items stay raw so the dispatcher can parse
/// them one by one and isolate malformed entries.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesPayload {
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// One inbound user message.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    /// Sender wa_id; replies go back to this identifier.
    pub from: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

/// Text content of an inbound message.
#[derive(Debug, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

/// `value` of a `message_statuses` change.
#[derive(Debug, Default, Deserialize)]
pub struct StatusesPayload {
    #[serde(default)]
    pub statuses: Vec<StatusUpdate>,
}

/// Delivery-state update for a previously sent message. Logged only; no state
/// transition is modeled.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
}
