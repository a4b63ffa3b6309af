//! Webhook signature verification (X-Hub-Signature-256).
//!
//! Meta signs every webhook POST body with HMAC-SHA256 under the app secret and
//! sends the digest as `"sha256=" + hex` in the X-Hub-Signature-256 header. The
//! check runs over the raw body bytes, before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a webhook POST failed verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// App secret is not configured. Fail closed rather than accept unsigned traffic.
    #[error("app secret is not configured")]
    SecretNotConfigured,

    /// Request carried no X-Hub-Signature-256 header.
    #[error("missing X-Hub-Signature-256 header")]
    MissingSignature,

    /// Header present but not `sha256=` followed by hex.
    #[error("malformed X-Hub-Signature-256 header")]
    MalformedSignature,

    /// Digest does not match the body.
    #[error("signature mismatch")]
    Mismatch,
}

/// Check `signature_header` against the HMAC-SHA256 digest of `body` under `app_secret`.
///
/// The comparison is constant-time (`Mac::verify_slice`); a decoded signature of
/// the wrong length also reports `Mismatch`. Malformed attacker input is returned
/// as an error, never propagated as a panic.
pub fn verify_signature(
    app_secret: Option<&str>,
    body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), VerifyError> {
    let secret = app_secret.ok_or(VerifyError::SecretNotConfigured)?;
    let header = signature_header.ok_or(VerifyError::MissingSignature)?;
    let hex_sig = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(VerifyError::MalformedSignature)?;
    let expected = hex::decode(hex_sig).map_err(|_| VerifyError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerifyError::SecretNotConfigured)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| VerifyError::Mismatch)
}
