//! Document store access.
//!
//! # Collections
//!
//! - `users` - accounts with the embedded cart sub-document
//! - `products` - the catalog
//! - `orders` - immutable purchase snapshots
//!
//! Unique indexes (created at startup by [`ensure_indexes`]):
//!
//! - `users.email`
//! - `orders.checkout_session_id` - the idempotency marker that makes webhook
//!   redelivery safe

pub mod orders;
pub mod products;
pub mod users;

use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::ShopConfig;
use crate::models::{Order, User};

/// Errors surfaced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Document store operation failed.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Connect to the document store and select the configured database.
///
/// # Errors
///
/// Returns `mongodb::error::Error` if the connection string is invalid or the
/// deployment is unreachable.
pub async fn connect(config: &ShopConfig) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(config.database_url.expose_secret()).await?;
    Ok(client.database(&config.database_name))
}

/// Create the unique indexes the application relies on.
///
/// Idempotent: creating an existing index is a no-op server-side.
///
/// # Errors
///
/// Returns `mongodb::error::Error` if index creation fails.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    db.collection::<User>(users::COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    db.collection::<Order>(orders::COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "checkout_session_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    Ok(())
}

/// Parse an id string into an `ObjectId`.
///
/// A malformed id cannot name any stored document, so it behaves like a
/// missing one rather than an error.
pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, RepositoryError> {
    ObjectId::parse_str(raw).map_err(|_| RepositoryError::NotFound)
}

/// Whether a store error is a unique-index violation.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_err)) =
        &*err.kind
    {
        write_err.code == 11000
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id_valid() {
        let oid = ObjectId::new();
        assert!(parse_object_id(&oid.to_hex()).is_ok());
    }

    #[test]
    fn test_parse_object_id_malformed_is_not_found() {
        assert!(matches!(
            parse_object_id("not-an-object-id"),
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            parse_object_id(""),
            Err(RepositoryError::NotFound)
        ));
    }
}
