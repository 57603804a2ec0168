//! Gateway webhook endpoint.
//!
//! The single write path for orders. The signature is verified over the raw
//! request bytes before the body is interpreted; unknown event types are
//! acknowledged so the gateway stops redelivering them.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use secrecy::ExposeSecret;
use serde_json::{Value, json};

use crate::payments::webhook::{self, GatewayEvent};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Receive a signed gateway event.
///
/// Responses drive the gateway's retry loop: 400 for anything unverifiable
/// (retrying cannot help), 500 for processing failures (redelivery will), and
/// 200 once the event is handled or recognized as a duplicate or irrelevant.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(signature) = headers
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("webhook delivery without signature header");
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "missing signature"})));
    };

    let secret = state.config().gateway.webhook_secret.expose_secret();
    let now = chrono::Utc::now().timestamp();
    if let Err(e) = webhook::verify(secret, signature, &body, now) {
        tracing::warn!(error = %e, "webhook signature rejected");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid signature"})),
        );
    }

    let event = match GatewayEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "verified webhook body is not an event");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "malformed event"})),
            );
        }
    };

    let session = match event.completed_session() {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::debug!(event_type = %event.event_type, "ignoring event type");
            return (StatusCode::OK, Json(json!({"received": true})));
        }
        Err(e) => {
            tracing::warn!(event_id = %event.id, error = %e, "malformed session payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "malformed event"})),
            );
        }
    };

    let service = CheckoutService::new(state.db(), state.gateway(), state.config());
    match service.complete(&session).await {
        Ok(()) => (StatusCode::OK, Json(json!({"received": true}))),
        Err(e) => {
            sentry::capture_error(&e);
            tracing::error!(session_id = %session.id, error = %e, "order processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "processing failed"})),
            )
        }
    }
}
