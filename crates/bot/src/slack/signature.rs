//! Slack request signature verification.
//!
//! Implements <https://api.slack.com/authentication/verifying-requests-from-slack>:
//! HMAC-SHA256 over `v0:{timestamp}:{body}` keyed by the app's signing
//! secret, sent as `v0=<hex>` in `X-Slack-Signature`.

use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument};

use super::error::SlackError;

/// Header carrying the request timestamp (Unix seconds).
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
/// Header carrying the `v0=<hex>` signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

const SIGNING_VERSION: &str = "v0";

type HmacSha256 = Hmac<Sha256>;

/// Compute the `v0=<hex>` signature Slack would send for this request.
///
/// Returns an empty string if `secret` is not usable as an HMAC key.
#[must_use]
pub fn compute_signature(body: &[u8], timestamp: &str, secret: &str) -> String {
    signature_mac(body, timestamp, secret).map_or_else(String::new, |mac| {
        format!(
            "{SIGNING_VERSION}={}",
            hex::encode(mac.finalize().into_bytes())
        )
    })
}

/// Check `provided_signature` against the body and timestamp.
///
/// The digest comparison is constant-time. Returns `false` on any mismatch
/// or malformed input; never errors.
#[must_use]
pub fn verify(body: &[u8], timestamp: &str, provided_signature: &str, secret: &str) -> bool {
    let Some(hex_digest) = provided_signature
        .strip_prefix(SIGNING_VERSION)
        .and_then(|rest| rest.strip_prefix('='))
    else {
        return false;
    };

    let Ok(digest) = hex::decode(hex_digest) else {
        return false;
    };

    // Slack sends lowercase hex; anything else is not a signature it produced.
    if hex::encode(&digest) != hex_digest {
        return false;
    }

    signature_mac(body, timestamp, secret).is_some_and(|mac| mac.verify_slice(&digest).is_ok())
}

fn signature_mac(body: &[u8], timestamp: &str, secret: &str) -> Option<HmacSha256> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return None;
    };
    mac.update(SIGNING_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Some(mac)
}

/// Request-level verifier holding the signing secret and replay window.
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
    max_age: Option<Duration>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_secret", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier. `max_age` of `None` disables the replay check.
    #[must_use]
    pub const fn new(signing_secret: SecretString, max_age: Option<Duration>) -> Self {
        Self {
            signing_secret,
            max_age,
        }
    }

    /// Verify a request's signature headers against its raw body.
    ///
    /// # Errors
    ///
    /// Returns `SlackError::InvalidSignature` if a header is missing, the
    /// timestamp is outside the replay window, or the signature does not
    /// match.
    #[instrument(skip_all)]
    pub fn verify_request(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SlackError> {
        let timestamp = timestamp
            .ok_or_else(|| SlackError::InvalidSignature("Missing timestamp header".to_string()))?;
        let signature = signature
            .ok_or_else(|| SlackError::InvalidSignature("Missing signature header".to_string()))?;

        self.verify_at(timestamp, signature, body, chrono::Utc::now().timestamp())
    }

    /// Same as [`Self::verify_request`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Self::verify_request`].
    pub fn verify_at(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now: i64,
    ) -> Result<(), SlackError> {
        if let Some(max_age) = self.max_age {
            let ts: i64 = timestamp
                .trim()
                .parse()
                .map_err(|_| SlackError::InvalidSignature("Invalid timestamp".to_string()))?;

            if now.saturating_sub(ts).unsigned_abs() > max_age.as_secs() {
                return Err(SlackError::InvalidSignature(
                    "Request timestamp outside replay window".to_string(),
                ));
            }
        }

        if !verify(
            body,
            timestamp,
            signature,
            self.signing_secret.expose_secret(),
        ) {
            return Err(SlackError::InvalidSignature(
                "Signature mismatch".to_string(),
            ));
        }

        debug!("Slack signature verified");

        Ok(())
    }
}
