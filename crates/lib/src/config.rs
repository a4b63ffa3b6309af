//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.wareply/config.json`) and environment.
//! Environment variables override file values so deployments can keep secrets out of
//! the config file entirely.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook listener settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Webhook listener bind, port, and verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Listener port (default 3000).
    #[serde(default = "default_webhook_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0" — Meta must be able to reach the listener).
    #[serde(default = "default_webhook_bind")]
    pub bind: String,

    /// Token echoed back during the subscribe handshake. Overridden by
    /// WHATSAPP_VERIFY_TOKEN env when set.
    pub verify_token: Option<String>,

    /// App secret for X-Hub-Signature-256 verification. Overridden by
    /// META_APP_SECRET env when set.
    pub app_secret: Option<String>,
}

fn default_webhook_port() -> u16 {
    3000
}

fn default_webhook_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            port: default_webhook_port(),
            bind: default_webhook_bind(),
            verify_token: None,
            app_secret: None,
        }
    }
}

/// WhatsApp Cloud API credentials and endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Bearer token for the Cloud API. Overridden by WHATSAPP_TOKEN env when set.
    pub api_token: Option<String>,

    /// Phone number id the replies are sent from. Overridden by PHONE_NUMBER_ID env when set.
    pub phone_number_id: Option<String>,

    /// Graph API base URL override (e.g. a staging or mock endpoint). When unset,
    /// the production Graph API is used. Overridden by WHATSAPP_API_BASE env when set.
    pub api_base: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn env_override(var: &str) -> Option<String> {
    std::env::var(var).ok().as_deref().and_then(non_empty)
}

/// Resolve the handshake verify token: env WHATSAPP_VERIFY_TOKEN overrides config.
pub fn resolve_verify_token(config: &Config) -> Option<String> {
    env_override("WHATSAPP_VERIFY_TOKEN")
        .or_else(|| config.webhook.verify_token.as_deref().and_then(non_empty))
}

/// Resolve the app secret used for signature verification: env META_APP_SECRET overrides config.
pub fn resolve_app_secret(config: &Config) -> Option<String> {
    env_override("META_APP_SECRET")
        .or_else(|| config.webhook.app_secret.as_deref().and_then(non_empty))
}

/// Resolve the Cloud API bearer token: env WHATSAPP_TOKEN overrides config.
pub fn resolve_api_token(config: &Config) -> Option<String> {
    env_override("WHATSAPP_TOKEN")
        .or_else(|| config.whatsapp.api_token.as_deref().and_then(non_empty))
}

/// Resolve the sending phone number id: env PHONE_NUMBER_ID overrides config.
pub fn resolve_phone_number_id(config: &Config) -> Option<String> {
    env_override("PHONE_NUMBER_ID")
        .or_else(|| config.whatsapp.phone_number_id.as_deref().and_then(non_empty))
}

/// Resolve the Graph API base override: env WHATSAPP_API_BASE overrides config.
/// `None` means the sender uses the production Graph API.
pub fn resolve_api_base(config: &Config) -> Option<String> {
    env_override("WHATSAPP_API_BASE")
        .or_else(|| config.whatsapp.api_base.as_deref().and_then(non_empty))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WAREPLY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".wareply").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or WAREPLY_CONFIG_PATH). Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))
}

/// Write a default config file at `path`, creating the parent directory.
/// An existing file is left untouched.
pub fn init_config_file(path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if path.exists() {
        log::info!("config already exists at {}", path.display());
        return Ok(path.to_path_buf());
    }
    let s = serde_json::to_string_pretty(&Config::default())
        .context("serializing default config")?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(path.to_path_buf())
}
