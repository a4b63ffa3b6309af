//! Webhook HTTP server: subscribe handshake, signed event intake, dispatch.

use crate::config::{self, Config};
use crate::dispatch;
use crate::sender::WhatsAppClient;
use crate::verify::{self, VerifyError};
use crate::webhook::InboundEvent;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Header carrying the HMAC digest of the POST body.
const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Shared state for the webhook server. Built once at startup; read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Handshake token, env override applied.
    pub verify_token: Option<String>,
    /// Signing secret, env override applied.
    pub app_secret: Option<String>,
    pub whatsapp: Arc<WhatsAppClient>,
}

/// Resolve secrets/credentials once and build the shared state.
pub fn build_state(config: Config) -> AppState {
    let verify_token = config::resolve_verify_token(&config);
    let app_secret = config::resolve_app_secret(&config);
    let whatsapp = WhatsAppClient::new(
        config::resolve_api_token(&config),
        config::resolve_phone_number_id(&config),
        config::resolve_api_base(&config),
    );
    AppState {
        config: Arc::new(config),
        verify_token,
        app_secret,
        whatsapp: Arc::new(whatsapp),
    }
}

/// Router for the webhook surface: health probe plus GET/POST /webhook.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(state)
}

/// Run the webhook server; binds to config.webhook.bind:config.webhook.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_server(config: Config) -> Result<()> {
    let state = build_state(config);
    if state.app_secret.is_none() {
        log::warn!("app secret not configured; webhook POSTs will be rejected with 500");
    }
    if !state.whatsapp.is_configured() {
        log::warn!("WhatsApp API token or phone number id not configured; auto-replies will be dropped");
    }

    let bind_addr = format!(
        "{}:{}",
        state.config.webhook.bind, state.config.webhook.port
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("webhook listener on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("webhook server stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.webhook.port,
    }))
}

/// GET /webhook — subscribe handshake: echo hub.challenge when the mode is
/// "subscribe" and the token matches the configured value; 403 otherwise.
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    let token_ok = match state.verify_token.as_deref() {
        Some(expected) => token == Some(expected),
        None => false,
    };
    if mode == Some("subscribe") && token_ok {
        log::info!("webhook subscribe handshake verified");
        (StatusCode::OK, challenge).into_response()
    } else {
        log::warn!(
            "webhook handshake failed: mode={:?} token_present={}",
            mode,
            token.is_some()
        );
        StatusCode::FORBIDDEN.into_response()
    }
}

/// POST /webhook — verify the signature over the raw body, then dispatch and
/// acknowledge immediately. Delivery outcome never affects the response.
async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match verify::verify_signature(state.app_secret.as_deref(), &body, signature) {
        Ok(()) => {}
        Err(VerifyError::SecretNotConfigured) => {
            log::error!("cannot verify webhook POST: app secret is not configured");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Err(e) => {
            log::warn!("rejecting webhook POST: {}", e);
            return StatusCode::UNAUTHORIZED;
        }
    }

    // A signed but unparseable body is acknowledged; Meta only ever observes
    // 200/401/403/500 on this endpoint.
    let event: InboundEvent = match serde_json::from_slice(&body) {
        Ok(ev) => ev,
        Err(e) => {
            log::warn!("signed webhook body is not a valid event, ignoring: {}", e);
            return StatusCode::OK;
        }
    };
    dispatch::dispatch_event(state.whatsapp.clone(), &event);
    StatusCode::OK
}
