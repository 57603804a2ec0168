//! Webhook signature verification and event payloads.
//!
//! The gateway signs each delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` using the shared webhook secret, and sends the
//! result in the `Stripe-Signature` header as `t=<ts>,v1=<hex>`. Verification
//! runs over the exact raw request bytes, before any parsing.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Maximum accepted clock skew between the signed timestamp and now.
pub const TOLERANCE_SECS: i64 = 300;

/// Event type reporting a completed checkout session.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Signature verification failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The header is missing, or not in `t=...,v1=...` form.
    #[error("malformed signature header")]
    Malformed,
    /// The signed timestamp is outside the accepted tolerance.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,
    /// No candidate signature matched the expected HMAC.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a webhook delivery signature against the raw body bytes.
///
/// `now` is the current unix timestamp, passed in for testability.
///
/// # Errors
///
/// Returns the specific [`SignatureError`]; callers must reject the request
/// without interpreting the body in every failure case.
pub fn verify(
    secret: &str,
    signature_header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if (now - ts).abs() > TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    let expected = compute_signature(secret, timestamp, payload)?;

    if candidates
        .iter()
        .any(|candidate| constant_time_eq(&expected, candidate))
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Compute the hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub(crate) fn compute_signature(
    secret: &str,
    timestamp: &str,
    payload: &[u8],
) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

// =============================================================================
// Event payloads
// =============================================================================

/// A delivered gateway event.
///
/// `data.object` stays untyped until the event type is known; unknown event
/// types are acknowledged without ever interpreting their payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

/// The polymorphic event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The session object inside a `checkout.session.completed` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedSession {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub customer_details: Option<CustomerDetails>,
}

/// Buyer details collected by the hosted checkout page.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub address: Option<EventAddress>,
}

/// Address fields as delivered by the gateway; all optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct EventAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl GatewayEvent {
    /// Parse an event from verified raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the body is not a gateway event.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Extract the completed session, if this event reports one.
    ///
    /// Returns `Ok(None)` for every other event type.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the event claims to be a completed
    /// session but its payload does not parse as one.
    pub fn completed_session(&self) -> Result<Option<CompletedSession>, serde_json::Error> {
        if self.event_type != CHECKOUT_SESSION_COMPLETED {
            return Ok(None);
        }
        serde_json::from_value(self.data.object.clone()).map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_9f8e7d6c5b4a";
    const NOW: i64 = 1_756_300_000;

    fn signed_header(payload: &[u8], ts: i64) -> String {
        let sig = compute_signature(SECRET, &ts.to_string(), payload).unwrap();
        format!("t={ts},v1={sig}")
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let header = signed_header(payload, NOW);
        assert_eq!(verify(SECRET, &header, payload, NOW), Ok(()));
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = signed_header(payload, NOW);
        assert_eq!(
            verify(SECRET, &header, br#"{"id":"evt_2"}"#, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = signed_header(payload, NOW);
        assert_eq!(
            verify("whsec_other_1a2b3c4d", &header, payload, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let payload = b"{}";
        let header = signed_header(payload, NOW - TOLERANCE_SECS - 1);
        assert_eq!(
            verify(SECRET, &header, payload, NOW),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn test_verify_rejects_malformed_header() {
        assert_eq!(
            verify(SECRET, "garbage", b"{}", NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify(SECRET, "t=123", b"{}", NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify(SECRET, "v1=abcd", b"{}", NOW),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_verify_accepts_any_matching_candidate() {
        // Multiple v1 entries appear during secret rotation
        let payload = b"{}";
        let ts = NOW.to_string();
        let good = compute_signature(SECRET, &ts, payload).unwrap();
        let header = format!("t={ts},v1=deadbeef,v1={good}");
        assert_eq!(verify(SECRET, &header, payload, NOW), Ok(()));
    }

    #[test]
    fn test_parse_completed_session() {
        let payload = br#"{
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_42",
                    "metadata": { "user_id": "68ab41f2c9d8e34a5b6f7012" },
                    "customer_details": {
                        "email": "buyer@example.com",
                        "address": {
                            "line1": "12 Rose Lane",
                            "line2": null,
                            "city": "Springfield",
                            "state": "OR",
                            "postal_code": "97477",
                            "country": "US"
                        }
                    }
                }
            }
        }"#;

        let event = GatewayEvent::parse(payload).unwrap();
        assert_eq!(event.event_type, CHECKOUT_SESSION_COMPLETED);

        let session = event.completed_session().unwrap().unwrap();
        assert_eq!(session.id, "cs_test_42");
        assert_eq!(
            session.metadata.get("user_id").map(String::as_str),
            Some("68ab41f2c9d8e34a5b6f7012")
        );
        let details = session.customer_details.unwrap();
        assert_eq!(details.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(
            details.address.unwrap().city.as_deref(),
            Some("Springfield")
        );
    }

    #[test]
    fn test_other_event_types_have_no_session() {
        let payload = br#"{
            "id": "evt_9",
            "type": "payment_intent.created",
            "data": { "object": { "whatever": true } }
        }"#;

        let event = GatewayEvent::parse(payload).unwrap();
        assert!(event.completed_session().unwrap().is_none());
    }
}
