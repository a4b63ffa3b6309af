//! Outbound sends via the WhatsApp Cloud API (Graph API messages endpoint).

use serde_json::json;
use std::time::Duration;

/// Graph API base used when the config has no override.
const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Per-request timeout for outbound sends; a hung call is dropped, not retried.
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// WhatsApp Cloud API client: sends text messages from the configured phone number.
pub struct WhatsAppClient {
    api_token: Option<String>,
    phone_number_id: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl WhatsAppClient {
    pub fn new(
        api_token: Option<String>,
        phone_number_id: Option<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            api_token,
            phone_number_id,
            api_base: api_base.unwrap_or_else(|| GRAPH_API_BASE.to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// True when both the API token and the phone number id are configured.
    pub fn is_configured(&self) -> bool {
        self.api_token.is_some() && self.phone_number_id.is_some()
    }

    /// Send a text message to `to` (a wa_id from an inbound webhook).
    /// One POST, no retry; the caller decides whether a failure matters.
    pub async fn send_text_message(&self, to: &str, text: &str) -> Result<(), String> {
        let token = self
            .api_token
            .as_ref()
            .ok_or("WhatsApp API token not configured")?;
        let phone_number_id = self
            .phone_number_id
            .as_ref()
            .ok_or("phone number id not configured")?;
        let url = format!("{}/{}/messages", self.api_base, phone_number_id);
        let body = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "body": text }
        });
        let res = self
            .client
            .post(&url)
            .timeout(SEND_TIMEOUT)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("send message failed: {} {}", status, body));
        }
        log::info!("message sent to {}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_token_aborts_before_any_call() {
        let client = WhatsAppClient::new(None, Some("555".to_string()), None);
        let err = client.send_text_message("123", "hi").await.unwrap_err();
        assert!(err.contains("API token"));
    }

    #[tokio::test]
    async fn unconfigured_phone_number_aborts_before_any_call() {
        let client = WhatsAppClient::new(Some("token".to_string()), None, None);
        let err = client.send_text_message("123", "hi").await.unwrap_err();
        assert!(err.contains("phone number id"));
    }

    #[test]
    fn is_configured_requires_both_credentials() {
        assert!(WhatsAppClient::new(
            Some("token".to_string()),
            Some("555".to_string()),
            None
        )
        .is_configured());
        assert!(!WhatsAppClient::new(Some("token".to_string()), None, None).is_configured());
        assert!(!WhatsAppClient::new(None, None, None).is_configured());
    }
}
