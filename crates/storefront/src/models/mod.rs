//! Domain models persisted in the document store.
//!
//! Documents serialize directly with serde/bson. Prices are `rust_decimal`
//! values stored as strings (`serde-with-str`), ids are native `ObjectId`s.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{Order, OrderItem, ProductSnapshot, ShippingAddress};
pub use product::{MediaAsset, Product};
pub use session::{SessionUser, session_keys};
pub use user::{Cart, CartItem, User};
