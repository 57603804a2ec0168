//! User document with its embedded cart.
//!
//! The cart lives inside the user document; cart mutations are pure methods
//! here, persistence happens in the repository layer.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use clementine_core::UserId;

/// A storefront user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// User's email address (unique).
    pub email: String,
    /// Argon2 password hash.
    pub password_hash: String,
    /// The user's in-progress cart.
    #[serde(default)]
    pub cart: Cart,
}

impl User {
    /// The user's id as a shared [`UserId`].
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(self.id.to_hex())
    }
}

/// A user's in-progress cart: an ordered list of product references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// One cart line: a product reference and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ObjectId,
    pub quantity: u32,
}

impl Cart {
    /// Add one unit of a product.
    ///
    /// If the product is already in the cart its quantity is incremented;
    /// otherwise a new line with quantity 1 is appended.
    pub fn add(&mut self, product_id: ObjectId) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity += 1;
        } else {
            self.items.push(CartItem {
                product_id,
                quantity: 1,
            });
        }
    }

    /// Remove a product's line entirely. No-op if the product is absent.
    pub fn remove(&mut self, product_id: &ObjectId) {
        self.items.retain(|i| &i.product_id != product_id);
    }

    /// Empty the cart. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_new_product_appends_line() {
        let mut cart = Cart::default();
        let id = ObjectId::new();

        cart.add(id);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[test]
    fn test_add_same_product_increments_quantity() {
        let mut cart = Cart::default();
        let id = ObjectId::new();

        cart.add(id);
        cart.add(id);

        // One line, quantity 2 - never a duplicate line
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::default();
        let first = ObjectId::new();
        let second = ObjectId::new();

        cart.add(first);
        cart.add(second);
        cart.add(first);

        assert_eq!(cart.items[0].product_id, first);
        assert_eq!(cart.items[1].product_id, second);
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let mut cart = Cart::default();
        cart.add(ObjectId::new());

        cart.remove(&ObjectId::new());

        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn test_remove_drops_whole_line() {
        let mut cart = Cart::default();
        let id = ObjectId::new();
        cart.add(id);
        cart.add(id);

        cart.remove(&id);

        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::default();
        cart.add(ObjectId::new());
        cart.add(ObjectId::new());

        cart.clear();
        assert!(cart.is_empty());

        // Clearing an already-empty cart is a no-op
        cart.clear();
        assert!(cart.is_empty());
    }
}
