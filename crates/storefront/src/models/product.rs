//! Product document.

use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clementine_core::ProductId;

/// A catalog product.
///
/// Owned by the user who created it (the admin surface only edits own
/// products). The checkout flow references products but never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    /// Positive price in the currency's standard unit.
    pub price: Decimal,
    pub description: String,
    /// Image stored in the media store.
    pub image: MediaAsset,
    /// The user who manages this product.
    pub user_id: ObjectId,
}

impl Product {
    /// The product's id as a shared [`ProductId`].
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        ProductId::new(self.id.to_hex())
    }
}

/// A stored media asset: a public URL plus the handle needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Publicly accessible URL.
    pub url: String,
    /// Opaque handle for delete-by-handle.
    pub handle: String,
}
