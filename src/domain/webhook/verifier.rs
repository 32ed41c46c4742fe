//! Webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"` with the endpoint's signing
//! secret, compared in constant time, with a replay window on the timestamp.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::event::StripeEvent;
use super::errors::WebhookError;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Every `v1` entry; several are sent while a secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `t=<timestamp>,v1=<hex>[,v1=<hex>...][,v0=<hex>]`.
    ///
    /// Unknown keys (including the legacy `v0`) are ignored.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::MalformedHeader("expected key=value".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::MalformedHeader("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::MalformedHeader("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedHeader("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for provider webhook signatures.
pub struct StripeWebhookVerifier {
    secret: SecretString,
    require_livemode: bool,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            require_livemode: false,
        }
    }

    /// Rejects test-mode events when set.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    /// Verifies the signature against the current clock and decodes the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify_and_parse_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify_and_parse`](Self::verify_and_parse) with an explicit `now`.
    pub fn verify_and_parse_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            tracing::warn!(timestamp = header.timestamp, "Webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        if self.require_livemode && !event.livemode {
            tracing::warn!(event_id = %event.id, "Rejecting test-mode event");
            return Err(WebhookError::LivemodeMismatch);
        }

        Ok(event)
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::NotConfigured)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now
        .checked_sub(timestamp)
        .ok_or(WebhookError::InvalidTimestamp)?;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a valid `Stripe-Signature` header value for `payload`.
///
/// Public so integration tests and local tooling can sign fixtures.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return format!("t={}", timestamp),
    };
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
