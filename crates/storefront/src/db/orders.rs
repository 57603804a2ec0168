//! Order repository.
//!
//! Orders are written exactly once per completed checkout session and never
//! updated or deleted. [`OrderRepository::insert_unique`] enforces that
//! at-most-once property against webhook redelivery.

use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;

use clementine_core::OrderId;

use super::{RepositoryError, is_duplicate_key, parse_object_id};
use crate::models::Order;

/// Collection name for orders.
pub const COLLECTION: &str = "orders";

/// Outcome of an idempotent order insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderInsert {
    /// The order was persisted by this call.
    Inserted,
    /// An order for this checkout session already exists; nothing was written.
    AlreadyExists,
}

/// Repository for order documents.
pub struct OrderRepository<'a> {
    db: &'a Database,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> mongodb::Collection<Order> {
        self.db.collection(COLLECTION)
    }

    /// Insert an order unless one already exists for its checkout session.
    ///
    /// Two layers guard against duplicates: a lookup on
    /// `checkout_session_id`, and the unique index on that field which turns
    /// a concurrent race into a duplicate-key error mapped to
    /// [`OrderInsert::AlreadyExists`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup or insert fails for
    /// any reason other than the duplicate key.
    pub async fn insert_unique(&self, order: &Order) -> Result<OrderInsert, RepositoryError> {
        let existing = self
            .collection()
            .find_one(doc! { "checkout_session_id": &order.checkout_session_id })
            .await?;

        if existing.is_some() {
            return Ok(OrderInsert::AlreadyExists);
        }

        match self.collection().insert_one(order).await {
            Ok(_) => Ok(OrderInsert::Inserted),
            Err(e) if is_duplicate_key(&e) => Ok(OrderInsert::AlreadyExists),
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn get(&self, id: &OrderId) -> Result<Order, RepositoryError> {
        let oid = parse_object_id(id.as_str())?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Fetch all orders placed by `buyer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_buyer(&self, buyer: ObjectId) -> Result<Vec<Order>, RepositoryError> {
        let items = self
            .collection()
            .find(doc! { "user_id": buyer })
            .await?
            .try_collect()
            .await?;

        Ok(items)
    }
}
