use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{map_service_error, success_response};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{error, info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// POST /api/webhooks/:gateway
///
/// Verification fails closed: no configured secret means every delivery is
/// rejected. A verified event is always acknowledged with `received: true`,
/// including unknown event types and events whose order cannot be resolved;
/// the gateway would otherwise retry forever.
#[utoipa::path(
    post,
    path = "/api/webhooks/{gateway}",
    params(("gateway" = String, Path, description = "Payment provider key, e.g. stripe")),
    request_body = String,
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Signature verification failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown gateway", body = crate::errors::ErrorResponse)
    ),
    tag = "Webhooks"
)]
pub async fn gateway_webhook(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if gateway != state.gateway.provider() {
        return Err(ApiError::NotFound(format!("Unknown gateway: {}", gateway)));
    }

    let Some(secret) = state.config.payment_webhook_secret.as_deref() else {
        error!("webhook received but no webhook secret is configured");
        return Err(ApiError::ServiceError(ServiceError::SignatureInvalid));
    };

    let tolerance = state
        .config
        .payment_webhook_tolerance_secs
        .unwrap_or(DEFAULT_TOLERANCE_SECS);
    if !verify_signature(&headers, &body, secret, tolerance) {
        warn!("webhook signature verification failed");
        return Err(ApiError::ServiceError(ServiceError::SignatureInvalid));
    }

    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid json: {}", e)))?;

    let event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or("");
    match event_type {
        "payment_intent.succeeded" => apply_payment_outcome(&state, &event, true).await?,
        "payment_intent.payment_failed" => apply_payment_outcome(&state, &event, false).await?,
        other => {
            info!(event_type = other, "unhandled webhook event type");
        }
    }

    Ok(success_response(json!({ "received": true })))
}

/// Maps a settled payment intent onto the referenced order. Missing or
/// unknown order references are logged and dropped; the event is still
/// acknowledged. Database failures propagate so the gateway retries.
async fn apply_payment_outcome(
    state: &AppState,
    event: &Value,
    succeeded: bool,
) -> Result<(), ApiError> {
    let order_id = event
        .pointer("/data/object/metadata/order_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok());

    let Some(order_id) = order_id else {
        error!("webhook event carries no usable order_id metadata");
        return Ok(());
    };

    let result = if succeeded {
        state.services.orders.record_payment_success(order_id).await
    } else {
        state.services.orders.record_payment_failure(order_id).await
    };

    match result {
        Ok(_) => Ok(()),
        Err(ServiceError::NotFound(_)) => {
            warn!(%order_id, "webhook references an unknown order, dropping");
            Ok(())
        }
        Err(e) => Err(map_service_error(e)),
    }
}

/// Checks an HMAC-SHA256 signature over `"{timestamp}.{body}"`. Accepts
/// either the provider's `Stripe-Signature: t=...,v1=...` header or plain
/// `x-timestamp`/`x-signature` headers; the timestamp must be within the
/// tolerance window either way.
pub fn verify_signature(
    headers: &HeaderMap,
    payload: &Bytes,
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    if let (Some(ts), Some(sig)) = (headers.get("x-timestamp"), headers.get("x-signature")) {
        if let (Ok(ts), Ok(sig)) = (ts.to_str(), sig.to_str()) {
            return check_signed_payload(ts, sig, payload, secret, tolerance_secs);
        }
    }

    if let Some(header) = headers.get("Stripe-Signature").and_then(|h| h.to_str().ok()) {
        let mut ts = "";
        let mut v1 = "";
        for part in header.split(',') {
            let mut it = part.trim().splitn(2, '=');
            match (it.next(), it.next()) {
                (Some("t"), Some(val)) => ts = val,
                (Some("v1"), Some(val)) => v1 = val,
                _ => {}
            }
        }
        if !ts.is_empty() && !v1.is_empty() {
            return check_signed_payload(ts, v1, payload, secret, tolerance_secs);
        }
    }

    false
}

fn check_signed_payload(
    timestamp: &str,
    signature: &str,
    payload: &Bytes,
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    match timestamp.parse::<i64>() {
        Ok(ts) => {
            // checked_sub: the timestamp is attacker-controlled and an
            // extreme value would overflow the subtraction.
            let now = chrono::Utc::now().timestamp();
            match now.checked_sub(ts) {
                Some(skew) if skew.unsigned_abs() <= tolerance_secs => {}
                _ => return false,
            }
        }
        Err(_) => return false,
    }

    let signed = format!("{}.{}", timestamp, std::str::from_utf8(payload).unwrap_or(""));
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, body).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn stripe_format_verifies() {
        let secret = "whsec_test";
        let body = Bytes::from_static(b"{\"type\":\"payment_intent.succeeded\"}");
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(secret, ts, std::str::from_utf8(&body).unwrap());

        let mut headers = HeaderMap::new();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", ts, sig).parse().unwrap(),
        );
        assert!(verify_signature(&headers, &body, secret, 300));
    }

    #[test]
    fn generic_header_format_verifies() {
        let secret = "whsec_test";
        let body = Bytes::from_static(b"{}");
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(secret, ts, "{}");

        let mut headers = HeaderMap::new();
        headers.insert("x-timestamp", ts.to_string().parse().unwrap());
        headers.insert("x-signature", sig.parse().unwrap());
        assert!(verify_signature(&headers, &body, secret, 300));
    }

    #[test]
    fn wrong_secret_rejected() {
        let body = Bytes::from_static(b"{}");
        let ts = chrono::Utc::now().timestamp();
        let sig = sign("whsec_other", ts, "{}");

        let mut headers = HeaderMap::new();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", ts, sig).parse().unwrap(),
        );
        assert!(!verify_signature(&headers, &body, "whsec_test", 300));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let secret = "whsec_test";
        let body = Bytes::from_static(b"{}");
        let ts = chrono::Utc::now().timestamp() - 3600;
        let sig = sign(secret, ts, "{}");

        let mut headers = HeaderMap::new();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", ts, sig).parse().unwrap(),
        );
        assert!(!verify_signature(&headers, &body, secret, 300));
    }

    #[test]
    fn extreme_timestamps_rejected_without_panic() {
        let secret = "whsec_test";
        let body = Bytes::from_static(b"{}");
        for ts in [i64::MIN, i64::MAX] {
            let sig = sign(secret, ts, "{}");
            let mut headers = HeaderMap::new();
            headers.insert(
                "Stripe-Signature",
                format!("t={},v1={}", ts, sig).parse().unwrap(),
            );
            assert!(!verify_signature(&headers, &body, secret, 300));
        }
    }

    #[test]
    fn missing_headers_rejected() {
        let body = Bytes::from_static(b"{}");
        assert!(!verify_signature(&HeaderMap::new(), &body, "whsec_test", 300));
    }

    #[test]
    fn tampered_body_rejected() {
        let secret = "whsec_test";
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(secret, ts, "{\"amount\":100}");

        let mut headers = HeaderMap::new();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", ts, sig).parse().unwrap(),
        );
        let tampered = Bytes::from_static(b"{\"amount\":999}");
        assert!(!verify_signature(&headers, &tampered, secret, 300));
    }
}
