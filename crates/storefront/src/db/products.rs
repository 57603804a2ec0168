//! Product repository and catalog pagination.

use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;

use clementine_core::ProductId;

use super::{RepositoryError, parse_object_id};
use crate::models::Product;

/// Collection name for products.
pub const COLLECTION: &str = "products";

/// One page of catalog results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

/// Derived pagination flags for a 1-based page over a known total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: u32,
    pub previous_page: u32,
    /// `ceil(total / page_size)`; 0 when the catalog is empty.
    pub last_page: u64,
}

impl PageInfo {
    /// Compute pagination flags.
    ///
    /// Out-of-range pages are legal and simply have `has_next == false`.
    #[must_use]
    pub fn compute(current_page: u32, page_size: u32, total: u64) -> Self {
        let last_page = total.div_ceil(u64::from(page_size));
        Self {
            current_page,
            has_next: u64::from(current_page) * u64::from(page_size) < total,
            has_previous: current_page > 1,
            next_page: current_page.saturating_add(1),
            previous_page: current_page.saturating_sub(1).max(1),
            last_page,
        }
    }
}

/// Repository for product documents.
pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> mongodb::Collection<Product> {
        self.db.collection(COLLECTION)
    }

    /// Fetch one catalog page in store-default (insertion) order.
    ///
    /// `page` is 1-based; a page past the end yields an empty page, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the count or query fails.
    pub async fn find_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Product>, RepositoryError> {
        let total = self.collection().count_documents(doc! {}).await?;

        let skip = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let items = self
            .collection()
            .find(doc! {})
            .skip(skip)
            .limit(i64::from(page_size))
            .await?
            .try_collect()
            .await?;

        Ok(Page {
            items,
            info: PageInfo::compute(page, page_size, total),
        })
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let oid = parse_object_id(id.as_str())?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Fetch all products whose ids are in `ids`.
    ///
    /// Missing ids are silently absent from the result; callers decide how to
    /// treat dangling references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = self
            .collection()
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;

        Ok(items)
    }

    /// Fetch all products managed by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_owner(&self, owner: ObjectId) -> Result<Vec<Product>, RepositoryError> {
        let items = self
            .collection()
            .find(doc! { "user_id": owner })
            .await?
            .try_collect()
            .await?;

        Ok(items)
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        self.collection().insert_one(product).await?;
        Ok(())
    }

    /// Replace an existing product document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    pub async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = self
            .collection()
            .replace_one(doc! { "_id": product.id }, product)
            .await?;

        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a product, returning the deleted document (for media cleanup).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn delete(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let oid = parse_object_id(id.as_str())?;
        self.collection()
            .find_one_and_delete(doc! { "_id": oid })
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_middle_page() {
        let info = PageInfo::compute(3, 2, 23);
        assert!(info.has_next);
        assert!(info.has_previous);
        assert_eq!(info.next_page, 4);
        assert_eq!(info.previous_page, 2);
        assert_eq!(info.last_page, 12);
    }

    #[test]
    fn test_page_info_first_page() {
        let info = PageInfo::compute(1, 2, 23);
        assert!(info.has_next);
        assert!(!info.has_previous);
        assert_eq!(info.previous_page, 1);
    }

    #[test]
    fn test_page_info_exact_last_page() {
        // total=23, size=2: page 12 holds the 23rd item and nothing follows
        let info = PageInfo::compute(12, 2, 23);
        assert!(!info.has_next);
        assert!(info.has_previous);
        assert_eq!(info.last_page, 12);
    }

    #[test]
    fn test_page_info_past_the_end() {
        let info = PageInfo::compute(40, 2, 23);
        assert!(!info.has_next);
        assert_eq!(info.last_page, 12);
    }

    #[test]
    fn test_page_info_empty_catalog() {
        let info = PageInfo::compute(1, 6, 0);
        assert!(!info.has_next);
        assert!(!info.has_previous);
        assert_eq!(info.last_page, 0);
    }

    #[test]
    fn test_page_info_even_split() {
        let info = PageInfo::compute(1, 2, 24);
        assert_eq!(info.last_page, 12);
        assert!(info.has_next);
    }
}
