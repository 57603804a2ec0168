//! Payment gateway client.
//!
//! The gateway hosts the checkout page; this client creates one-time-payment
//! sessions over its REST API and hands the buyer a redirect URL. Session
//! completion arrives asynchronously through the signed webhook handled in
//! [`webhook`].

pub mod webhook;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GatewayConfig;

/// Errors from the payment gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure talking to the gateway.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("gateway returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// One line item of a checkout session, priced in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub description: String,
    /// Unit amount in minor units (cents).
    pub unit_amount: i64,
    pub quantity: u32,
}

/// Inputs for creating a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub line_items: Vec<SessionLineItem>,
    pub customer_email: String,
    /// Correlation metadata: the buyer's user id, echoed back in the webhook.
    pub user_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created checkout session: the id we correlate on and the hosted page URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// REST client for the payment gateway.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` on transport failure and
    /// `GatewayError::Api` if the gateway rejects the request.
    pub async fn create_checkout_session(
        &self,
        params: &CreateSessionParams,
    ) -> Result<CheckoutSession, GatewayError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_url);
        let form = session_form_params(params, &self.config.currency);

        let response = self
            .http
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Some(""))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "gateway rejected checkout session request");
            return Err(GatewayError::Api { status, body });
        }

        let session: CheckoutSession = response.json().await?;
        tracing::info!(session_id = %session.id, "checkout session created");
        Ok(session)
    }
}

/// Build the form-encoded body for session creation.
///
/// The gateway's API takes indexed bracket notation for nested fields
/// (`line_items[0][price_data][unit_amount]`).
fn session_form_params(params: &CreateSessionParams, currency: &str) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_owned(), "payment".to_owned()),
        (
            "billing_address_collection".to_owned(),
            "required".to_owned(),
        ),
        ("customer_email".to_owned(), params.customer_email.clone()),
        ("metadata[user_id]".to_owned(), params.user_id.clone()),
        ("success_url".to_owned(), params.success_url.clone()),
        ("cancel_url".to_owned(), params.cancel_url.clone()),
    ];

    for (i, item) in params.line_items.iter().enumerate() {
        form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        form.push((
            format!("line_items[{i}][price_data][currency]"),
            currency.to_owned(),
        ));
        form.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][description]"),
            item.description.clone(),
        ));
    }

    form
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params() -> CreateSessionParams {
        CreateSessionParams {
            line_items: vec![
                SessionLineItem {
                    name: "Teapot".to_owned(),
                    description: "A teapot".to_owned(),
                    unit_amount: 1250,
                    quantity: 2,
                },
                SessionLineItem {
                    name: "Mug".to_owned(),
                    description: "A mug".to_owned(),
                    unit_amount: 500,
                    quantity: 1,
                },
            ],
            customer_email: "buyer@example.com".to_owned(),
            user_id: "68ab41f2c9d8e34a5b6f7012".to_owned(),
            success_url: "http://localhost:3000/checkout/success".to_owned(),
            cancel_url: "http://localhost:3000/checkout/cancel".to_owned(),
        }
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> &'a str {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_session_form_is_one_time_payment() {
        let form = session_form_params(&params(), "usd");
        assert_eq!(value(&form, "mode"), "payment");
        assert_eq!(value(&form, "billing_address_collection"), "required");
    }

    #[test]
    fn test_session_form_carries_correlation_metadata() {
        let form = session_form_params(&params(), "usd");
        assert_eq!(value(&form, "metadata[user_id]"), "68ab41f2c9d8e34a5b6f7012");
        assert_eq!(value(&form, "customer_email"), "buyer@example.com");
    }

    #[test]
    fn test_session_form_indexes_line_items() {
        let form = session_form_params(&params(), "usd");
        assert_eq!(value(&form, "line_items[0][quantity]"), "2");
        assert_eq!(value(&form, "line_items[0][price_data][unit_amount]"), "1250");
        assert_eq!(
            value(&form, "line_items[0][price_data][product_data][name]"),
            "Teapot"
        );
        assert_eq!(value(&form, "line_items[1][quantity]"), "1");
        assert_eq!(value(&form, "line_items[1][price_data][currency]"), "usd");
    }
}
