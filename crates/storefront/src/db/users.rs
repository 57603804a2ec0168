//! User repository.

use mongodb::Database;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, to_bson};

use clementine_core::UserId;

use super::{RepositoryError, is_duplicate_key, parse_object_id};
use crate::models::{Cart, User};

/// Collection name for users.
pub const COLLECTION: &str = "users";

/// Repository for user documents.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> mongodb::Collection<User> {
        self.db.collection(COLLECTION)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let oid = match parse_object_id(id.as_str()) {
            Ok(oid) => oid,
            Err(RepositoryError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(self.collection().find_one(doc! { "_id": oid }).await?)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.collection().find_one(doc! { "email": email }).await?)
    }

    /// Create a new user with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other store errors.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError> {
        let user = User {
            id: ObjectId::new(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            cart: Cart::default(),
        };

        self.collection().insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                RepositoryError::Conflict("email already exists".to_owned())
            } else {
                RepositoryError::Database(e)
            }
        })?;

        Ok(user)
    }

    /// Replace the user's embedded cart sub-document.
    ///
    /// This is the single persistence point for every cart mutation
    /// (add, remove, clear). Replacing with an empty cart is a no-op if the
    /// cart was already empty, which keeps cart-clearing safely repeatable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user no longer exists.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn save_cart(&self, user_id: ObjectId, cart: &Cart) -> Result<(), RepositoryError> {
        let cart_doc = to_bson(cart)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable cart: {e}")))?;

        let result = self
            .collection()
            .update_one(doc! { "_id": user_id }, doc! { "$set": { "cart": cart_doc } })
            .await?;

        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
