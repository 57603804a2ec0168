//! Cart resolution.
//!
//! A stored cart only holds product references; resolving it joins the
//! referenced products back in. References to deleted products are dropped
//! silently so a stale cart never blocks browsing or checkout.

use std::collections::HashMap;

use mongodb::Database;
use rust_decimal::Decimal;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::{Cart, Product};

/// A cart line joined with its product document.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub product: Product,
    pub quantity: u32,
}

impl ResolvedItem {
    /// Line total: quantity x unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.product.price
    }
}

/// A cart with all surviving product references resolved, in cart order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCart {
    pub items: Vec<ResolvedItem>,
}

impl ResolvedCart {
    /// Join cart lines with their products, preserving cart order.
    ///
    /// Lines whose product no longer exists are dropped.
    #[must_use]
    pub fn resolve(cart: &Cart, products: Vec<Product>) -> Self {
        let mut by_id: HashMap<_, _> = products.into_iter().map(|p| (p.id, p)).collect();

        let items = cart
            .items
            .iter()
            .filter_map(|line| {
                by_id.remove(&line.product_id).map(|product| ResolvedItem {
                    product,
                    quantity: line.quantity,
                })
            })
            .collect();

        Self { items }
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(ResolvedItem::line_total).sum()
    }

    /// Whether no lines survived resolution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart service: loads the products a cart references and resolves it.
pub struct CartService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            products: ProductRepository::new(db),
        }
    }

    /// Resolve a stored cart against the products collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the product lookup fails.
    pub async fn resolved_cart(&self, cart: &Cart) -> Result<ResolvedCart, RepositoryError> {
        let ids: Vec<_> = cart.items.iter().map(|i| i.product_id).collect();
        let products = self.products.find_by_ids(&ids).await?;
        Ok(ResolvedCart::resolve(cart, products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, MediaAsset};
    use mongodb::bson::oid::ObjectId;

    fn product(id: ObjectId, title: &str, price: Decimal) -> Product {
        Product {
            id,
            title: title.to_string(),
            price,
            description: String::new(),
            image: MediaAsset {
                url: "https://media.example.com/x.jpg".to_string(),
                handle: "x".to_string(),
            },
            user_id: ObjectId::new(),
        }
    }

    #[test]
    fn test_resolve_preserves_cart_order() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let cart = Cart {
            items: vec![
                CartItem {
                    product_id: b,
                    quantity: 1,
                },
                CartItem {
                    product_id: a,
                    quantity: 2,
                },
            ],
        };
        // Products arrive in lookup order, not cart order
        let products = vec![
            product(a, "A", Decimal::new(100, 2)),
            product(b, "B", Decimal::new(200, 2)),
        ];

        let resolved = ResolvedCart::resolve(&cart, products);

        assert_eq!(resolved.items[0].product.title, "B");
        assert_eq!(resolved.items[1].product.title, "A");
    }

    #[test]
    fn test_resolve_drops_dangling_references() {
        let alive = ObjectId::new();
        let deleted = ObjectId::new();
        let cart = Cart {
            items: vec![
                CartItem {
                    product_id: deleted,
                    quantity: 1,
                },
                CartItem {
                    product_id: alive,
                    quantity: 3,
                },
            ],
        };

        let resolved = ResolvedCart::resolve(&cart, vec![product(alive, "A", Decimal::ONE)]);

        assert_eq!(resolved.items.len(), 1);
        assert_eq!(resolved.items[0].quantity, 3);
    }

    #[test]
    fn test_total_sums_line_totals() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let cart = Cart {
            items: vec![
                CartItem {
                    product_id: a,
                    quantity: 2,
                },
                CartItem {
                    product_id: b,
                    quantity: 1,
                },
            ],
        };
        let products = vec![
            product(a, "A", Decimal::new(1250, 2)),
            product(b, "B", Decimal::new(500, 2)),
        ];

        let resolved = ResolvedCart::resolve(&cart, products);

        // 2 x 12.50 + 1 x 5.00
        assert_eq!(resolved.total(), Decimal::new(3000, 2));
    }

    #[test]
    fn test_empty_cart_resolves_empty() {
        let resolved = ResolvedCart::resolve(&Cart::default(), vec![]);
        assert!(resolved.is_empty());
        assert_eq!(resolved.total(), Decimal::ZERO);
    }
}
