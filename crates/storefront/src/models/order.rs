//! Order document: an immutable snapshot of a completed checkout.
//!
//! Product data is copied into the order, not referenced. Once persisted, an
//! order's titles and prices never change, even if the source product is
//! edited or deleted later.

use mongodb::bson::DateTime;
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clementine_core::OrderId;

/// A completed purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Gateway checkout session that produced this order. Unique: the
    /// idempotency key against webhook redelivery.
    pub checkout_session_id: String,
    /// Buyer email as reported by the gateway.
    pub email: String,
    /// Buyer user reference.
    pub user_id: ObjectId,
    /// Shipping address from the gateway event, when the buyer supplied one.
    pub shipping_address: Option<ShippingAddress>,
    /// Snapshot line items.
    pub items: Vec<OrderItem>,
    /// When the order was materialized.
    pub placed_at: DateTime,
}

impl Order {
    /// The order's id as a shared [`OrderId`].
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        OrderId::new(self.id.to_hex())
    }
}

/// One purchased line: a product snapshot and its quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl OrderItem {
    /// Line total: quantity x unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.product.price
    }
}

/// Denormalized copy of the purchased product's fields.
///
/// An owned value, deliberately not a reference to the products collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Id of the product at purchase time (for invoice display only).
    pub product_id: ObjectId,
    pub title: String,
    pub price: Decimal,
}

/// Buyer-supplied shipping address from the gateway event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product: ProductSnapshot {
                product_id: ObjectId::new(),
                title: "Teapot".to_string(),
                price: Decimal::new(1250, 2),
            },
            quantity: 3,
        };

        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }
}
