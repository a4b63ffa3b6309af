//! Integration tests: start the webhook server on a free port with a mock
//! Graph API endpoint, then drive the subscribe handshake and signed event
//! intake end to end. Does not require real Meta credentials.

use axum::{extract::State, routing::post, Json, Router};
use hmac::{Hmac, Mac};
use lib::config::Config;
use lib::server;
use sha2::Sha256;
use std::time::Duration;
use tokio::sync::mpsc;

const APP_SECRET: &str = "integration-test-secret";
const VERIFY_TOKEN: &str = "handshake-token";
const PHONE_NUMBER_ID: &str = "5550001111";

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(APP_SECRET.as_bytes()).expect("hmac key");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

async fn capture_send(
    State(tx): State<mpsc::UnboundedSender<serde_json::Value>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let _ = tx.send(body);
    Json(serde_json::json!({ "messages": [{ "id": "wamid.test" }] }))
}

/// Start a mock Graph API that records every /{phone_number_id}/messages POST body.
async fn start_mock_graph_api() -> (String, mpsc::UnboundedReceiver<serde_json::Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/:phone_number_id/messages", post(capture_send))
        .with_state(tx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock graph api");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), rx)
}

/// Start the webhook server with full test config; returns its base URL.
async fn start_server(api_base: String) -> String {
    let port = free_port();
    let mut config = Config::default();
    config.webhook.port = port;
    config.webhook.bind = "127.0.0.1".to_string();
    config.webhook.verify_token = Some(VERIFY_TOKEN.to_string());
    config.webhook.app_secret = Some(APP_SECRET.to_string());
    config.whatsapp.api_token = Some("test-api-token".to_string());
    config.whatsapp.phone_number_id = Some(PHONE_NUMBER_ID.to_string());
    config.whatsapp.api_base = Some(api_base);

    tokio::spawn(async move {
        let _ = server::run_server(config).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&base).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("webhook server did not become healthy at {} within 5s", base);
}

fn sample_event() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "field": "messages",
                "value": { "messages": [{ "from": "123", "text": { "body": "hi" } }] }
            }]
        }]
    }))
    .expect("serialize sample event")
}

#[tokio::test]
async fn subscribe_handshake_echoes_challenge() {
    let (api_base, _rx) = start_mock_graph_api().await;
    let base = start_server(api_base).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token={}&hub.challenge=424242",
            base, VERIFY_TOKEN
        ))
        .send()
        .await
        .expect("handshake GET");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "424242");

    let resp = client
        .get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=424242",
            base
        ))
        .send()
        .await
        .expect("handshake GET with bad token");
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn signed_event_triggers_one_auto_reply() {
    let (api_base, mut rx) = start_mock_graph_api().await;
    let base = start_server(api_base).await;
    let client = reqwest::Client::new();

    let body = sample_event();
    let resp = client
        .post(format!("{}/webhook", base))
        .header("X-Hub-Signature-256", sign(&body))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("webhook POST");
    assert_eq!(resp.status(), 200);

    let outbound = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("auto-reply within 5s")
        .expect("mock channel open");
    assert_eq!(
        outbound.get("messaging_product").and_then(|v| v.as_str()),
        Some("whatsapp")
    );
    assert_eq!(
        outbound.get("recipient_type").and_then(|v| v.as_str()),
        Some("individual")
    );
    assert_eq!(outbound.get("to").and_then(|v| v.as_str()), Some("123"));
    assert_eq!(outbound.get("type").and_then(|v| v.as_str()), Some("text"));
    let reply = outbound
        .get("text")
        .and_then(|t| t.get("body"))
        .and_then(|v| v.as_str())
        .expect("text.body");
    assert!(reply.contains("You said: \"hi\""), "reply was {:?}", reply);

    // Exactly one reply for one message.
    let extra = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(extra.is_err(), "unexpected second outbound call: {:?}", extra);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_any_send() {
    let (api_base, mut rx) = start_mock_graph_api().await;
    let base = start_server(api_base).await;
    let client = reqwest::Client::new();

    let body = sample_event();
    let resp = client
        .post(format!("{}/webhook", base))
        .header(
            "X-Hub-Signature-256",
            "sha256=0000000000000000000000000000000000000000000000000000000000000000",
        )
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("webhook POST");
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{}/webhook", base))
        .header("Content-Type", "application/json")
        .body(sample_event())
        .send()
        .await
        .expect("webhook POST without signature");
    assert_eq!(resp.status(), 401);

    let outbound = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(outbound.is_err(), "outbound call despite rejected POST");
}

#[tokio::test]
async fn signed_garbage_body_is_acknowledged() {
    let (api_base, mut rx) = start_mock_graph_api().await;
    let base = start_server(api_base).await;
    let client = reqwest::Client::new();

    let body = b"this is not json".to_vec();
    let resp = client
        .post(format!("{}/webhook", base))
        .header("X-Hub-Signature-256", sign(&body))
        .body(body)
        .send()
        .await
        .expect("webhook POST");
    assert_eq!(resp.status(), 200);

    let outbound = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(outbound.is_err(), "outbound call for unparseable body");
}
