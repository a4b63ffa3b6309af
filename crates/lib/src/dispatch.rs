//! Walks verified webhook events and triggers an auto-reply per inbound text message.

use crate::sender::WhatsAppClient;
use crate::webhook::{InboundChange, InboundEvent, InboundMessage, WHATSAPP_OBJECT};
use std::sync::Arc;

/// Quoted in the reply when a message carries no text body. Intentional echo
/// behavior, not an error.
pub const NO_TEXT_PLACEHOLDER: &str = "No Text Body";

/// One outbound reply the event calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Recipient wa_id (the `from` of the inbound message).
    pub to: String,
    pub body: String,
}

/// Reply text for one inbound message: quote the sender's text back.
fn reply_body(text: &str) -> String {
    format!("Thank you for your message! You said: \"{}\".", text)
}

/// Collect the replies an event calls for. Pure; no I/O.
///
/// Foreign `object` tags, missing entry lists, unknown change fields, and
/// malformed message items all yield diagnostics instead of errors, and a bad
/// item never aborts its siblings.
pub fn plan_replies(event: &InboundEvent) -> Vec<Reply> {
    if event.object != WHATSAPP_OBJECT {
        log::warn!("ignoring event with object {:?}", event.object);
        return Vec::new();
    }
    let Some(ref entries) = event.entry else {
        log::warn!("event has no entry list, ignoring");
        return Vec::new();
    };

    let mut replies = Vec::new();
    for entry in entries {
        for change in &entry.changes {
            match change {
                InboundChange::Messages(payload) => {
                    for raw in &payload.messages {
                        let msg: InboundMessage = match serde_json::from_value(raw.clone()) {
                            Ok(m) => m,
                            Err(e) => {
                                log::warn!("skipping malformed message item: {}", e);
                                continue;
                            }
                        };
                        let text = msg
                            .text
                            .as_ref()
                            .map(|t| t.body.as_str())
                            .unwrap_or(NO_TEXT_PLACEHOLDER);
                        log::info!("incoming message {:?} from {}", text, msg.from);
                        replies.push(Reply {
                            to: msg.from,
                            body: reply_body(text),
                        });
                    }
                }
                InboundChange::MessageStatuses(payload) => {
                    for status in &payload.statuses {
                        log::info!(
                            "status update for message {}: {}",
                            status.id,
                            status.status
                        );
                    }
                }
                InboundChange::Other(_) => {}
            }
        }
    }
    replies
}

/// Send every reply the event calls for, each as an independent fire-and-forget
/// task. Failures are logged inside the task; nothing is awaited by the
/// caller's response path.
pub fn dispatch_event(client: Arc<WhatsAppClient>, event: &InboundEvent) {
    for reply in plan_replies(event) {
        let client = client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send_text_message(&reply.to, &reply.body).await {
                log::warn!("auto-reply to {} failed: {}", reply.to, e);
            }
        });
    }
}
