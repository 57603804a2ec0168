//! Checkout workflow.
//!
//! Two halves, separated by the payment gateway's hosted page:
//! [`CheckoutService::begin`] turns the buyer's cart into a gateway session
//! and hands back the redirect URL; [`CheckoutService::complete`] runs on the
//! verified webhook, materializes the order snapshot exactly once, and clears
//! the cart. Payment state never round-trips through the browser.

use mongodb::Database;
use mongodb::bson::DateTime;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use clementine_core::{UserId, to_minor_units};

use crate::config::ShopConfig;
use crate::db::RepositoryError;
use crate::db::orders::{OrderInsert, OrderRepository};
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::{Order, OrderItem, ProductSnapshot, ShippingAddress, User};
use crate::payments::webhook::{CompletedSession, EventAddress};
use crate::payments::{CheckoutSession, CreateSessionParams, GatewayClient, GatewayError, SessionLineItem};
use crate::services::cart::{CartService, ResolvedCart};

/// Errors from the checkout workflow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requested with no items in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A product price does not fit the gateway's minor-unit integer.
    #[error("price not representable in minor units: {0}")]
    PriceOverflow(String),

    /// The completed session cannot be tied back to a buyer. The webhook
    /// responds 500 so the gateway redelivers.
    #[error("cannot resolve buyer for session: {0}")]
    MissingBuyer(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Payment gateway error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::EmptyCart,
            CheckoutError::PriceOverflow(msg) | CheckoutError::MissingBuyer(msg) => {
                Self::Internal(msg)
            }
            CheckoutError::Repository(e) => e.into(),
            CheckoutError::Gateway(e) => Self::Gateway(e),
        }
    }
}

/// Checkout service.
pub struct CheckoutService<'a> {
    db: &'a Database,
    gateway: &'a GatewayClient,
    config: &'a ShopConfig,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(db: &'a Database, gateway: &'a GatewayClient, config: &'a ShopConfig) -> Self {
        Self {
            db,
            gateway,
            config,
        }
    }

    /// Start checkout: create a gateway session for the buyer's current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` when the resolved cart has no items.
    /// Cart lines whose product was deleted do not count.
    pub async fn begin(&self, user: &User) -> Result<CheckoutSession, CheckoutError> {
        let resolved = CartService::new(self.db).resolved_cart(&user.cart).await?;
        if resolved.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let params = CreateSessionParams {
            line_items: build_line_items(&resolved)?,
            customer_email: user.email.clone(),
            user_id: user.id.to_hex(),
            success_url: format!("{}/checkout/success", self.config.base_url),
            cancel_url: format!("{}/checkout/cancel", self.config.base_url),
        };

        let session = self.gateway.create_checkout_session(&params).await?;
        tracing::info!(user_id = %user.id, session_id = %session.id, "checkout started");
        Ok(session)
    }

    /// Finish checkout from a verified `checkout.session.completed` event.
    ///
    /// Idempotent per session id: a redelivered event finds the existing
    /// order and writes nothing. The cart is cleared only after the order is
    /// durably stored, so a crash in between re-creates nothing worse than a
    /// still-filled cart the next delivery will clear.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingBuyer` when the session metadata lacks
    /// a user id or the referenced user is gone; callers must respond with a
    /// server error so the gateway retries.
    pub async fn complete(&self, session: &CompletedSession) -> Result<(), CheckoutError> {
        let user_id = session
            .metadata
            .get("user_id")
            .ok_or_else(|| CheckoutError::MissingBuyer(session.id.clone()))?;

        let users = UserRepository::new(self.db);
        let user = users
            .get_by_id(&UserId::new(user_id.clone()))
            .await?
            .ok_or_else(|| CheckoutError::MissingBuyer(session.id.clone()))?;

        let resolved = CartService::new(self.db).resolved_cart(&user.cart).await?;
        let order = order_from_cart(&user, session, &resolved);

        let orders = OrderRepository::new(self.db);
        match orders.insert_unique(&order).await? {
            OrderInsert::Inserted => {
                tracing::info!(order_id = %order.id, session_id = %session.id, "order placed");
            }
            OrderInsert::AlreadyExists => {
                tracing::info!(session_id = %session.id, "duplicate completion event ignored");
            }
        }

        let mut cart = user.cart;
        cart.clear();
        users.save_cart(user.id, &cart).await?;

        Ok(())
    }
}

/// Convert resolved cart lines to gateway line items in minor units.
fn build_line_items(cart: &ResolvedCart) -> Result<Vec<SessionLineItem>, CheckoutError> {
    cart.items
        .iter()
        .map(|item| {
            let unit_amount = to_minor_units(item.product.price)
                .ok_or_else(|| CheckoutError::PriceOverflow(item.product.title.clone()))?;
            Ok(SessionLineItem {
                name: item.product.title.clone(),
                description: item.product.description.clone(),
                unit_amount,
                quantity: item.quantity,
            })
        })
        .collect()
}

/// Build the immutable order snapshot for a completed session.
///
/// Titles and prices are copied out of the product documents; the order never
/// references the products collection again.
fn order_from_cart(user: &User, session: &CompletedSession, cart: &ResolvedCart) -> Order {
    let email = session
        .customer_details
        .as_ref()
        .and_then(|d| d.email.clone())
        .unwrap_or_else(|| user.email.clone());

    let shipping_address = session
        .customer_details
        .as_ref()
        .and_then(|d| d.address.as_ref())
        .and_then(shipping_address_from_event);

    let items = cart
        .items
        .iter()
        .map(|item| OrderItem {
            product: ProductSnapshot {
                product_id: item.product.id,
                title: item.product.title.clone(),
                price: item.product.price,
            },
            quantity: item.quantity,
        })
        .collect();

    Order {
        id: ObjectId::new(),
        checkout_session_id: session.id.clone(),
        email,
        user_id: user.id,
        shipping_address,
        items,
        placed_at: DateTime::now(),
    }
}

/// Convert a gateway event address. Requires at least a first line; the
/// remaining fields fall back to empty strings.
fn shipping_address_from_event(address: &EventAddress) -> Option<ShippingAddress> {
    let line1 = address.line1.clone()?;
    Some(ShippingAddress {
        line1,
        line2: address.line2.clone(),
        city: address.city.clone().unwrap_or_default(),
        state: address.state.clone().unwrap_or_default(),
        postal_code: address.postal_code.clone().unwrap_or_default(),
        country: address.country.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Cart, MediaAsset, Product};
    use crate::payments::webhook::CustomerDetails;
    use crate::services::cart::ResolvedItem;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn resolved(lines: Vec<(Decimal, u32)>) -> ResolvedCart {
        ResolvedCart {
            items: lines
                .into_iter()
                .enumerate()
                .map(|(i, (price, quantity))| ResolvedItem {
                    product: Product {
                        id: ObjectId::new(),
                        title: format!("Item {i}"),
                        price,
                        description: format!("Description {i}"),
                        image: MediaAsset {
                            url: "https://media.example.com/x.jpg".to_string(),
                            handle: "x".to_string(),
                        },
                        user_id: ObjectId::new(),
                    },
                    quantity,
                })
                .collect(),
        }
    }

    fn buyer() -> User {
        User {
            id: ObjectId::new(),
            email: "buyer@example.com".to_string(),
            password_hash: String::new(),
            cart: Cart::default(),
        }
    }

    fn completed_session(id: &str, user: &User) -> CompletedSession {
        CompletedSession {
            id: id.to_string(),
            metadata: HashMap::from([("user_id".to_string(), user.id.to_hex())]),
            customer_details: None,
        }
    }

    #[test]
    fn test_build_line_items_converts_to_minor_units() {
        let cart = resolved(vec![(Decimal::new(1250, 2), 2), (Decimal::new(500, 2), 1)]);

        let items = build_line_items(&cart).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit_amount, 1250);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].unit_amount, 500);
    }

    #[test]
    fn test_order_snapshot_copies_product_fields() {
        let user = buyer();
        let cart = resolved(vec![(Decimal::new(9999, 2), 3)]);
        let session = completed_session("cs_test_1", &user);

        let order = order_from_cart(&user, &session, &cart);

        assert_eq!(order.checkout_session_id, "cs_test_1");
        assert_eq!(order.user_id, user.id);
        assert_eq!(order.email, "buyer@example.com");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product.title, "Item 0");
        assert_eq!(order.items[0].product.price, Decimal::new(9999, 2));
        assert_eq!(order.items[0].quantity, 3);
        assert!(order.shipping_address.is_none());
    }

    #[test]
    fn test_order_prefers_gateway_reported_email() {
        let user = buyer();
        let cart = resolved(vec![(Decimal::ONE, 1)]);
        let mut session = completed_session("cs_test_2", &user);
        session.customer_details = Some(CustomerDetails {
            email: Some("receipt@example.com".to_string()),
            address: None,
        });

        let order = order_from_cart(&user, &session, &cart);

        assert_eq!(order.email, "receipt@example.com");
    }

    #[test]
    fn test_order_captures_shipping_address() {
        let user = buyer();
        let cart = resolved(vec![(Decimal::ONE, 1)]);
        let mut session = completed_session("cs_test_3", &user);
        session.customer_details = Some(CustomerDetails {
            email: None,
            address: Some(EventAddress {
                line1: Some("12 Rose Lane".to_string()),
                line2: None,
                city: Some("Springfield".to_string()),
                state: Some("OR".to_string()),
                postal_code: Some("97477".to_string()),
                country: Some("US".to_string()),
            }),
        });

        let order = order_from_cart(&user, &session, &cart);

        let address = order.shipping_address.unwrap();
        assert_eq!(address.line1, "12 Rose Lane");
        assert_eq!(address.city, "Springfield");
    }

    #[test]
    fn test_address_without_first_line_is_dropped() {
        let address = EventAddress {
            line1: None,
            line2: None,
            city: Some("Springfield".to_string()),
            state: None,
            postal_code: None,
            country: None,
        };

        assert!(shipping_address_from_event(&address).is_none());
    }
}
