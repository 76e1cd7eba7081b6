//! Persistence layer.
//!
//! The backend talks to its document store through the [`Store`] trait so the
//! concrete driver can be injected: [`MongoStore`] in production,
//! [`MemoryStore`] in tests and local development. All updates are
//! last-write-wins; there is no optimistic-concurrency guard.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use thiserror::Error;

use bazaar_core::{Email, ProductId, UserId};

use crate::models::{Product, Review, User};

/// Products returned per page by [`Store::list_products`].
pub const RESULT_PER_PAGE: u64 = 5;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver-level failure (connection, query, serialization).
    #[error("database error: {0}")]
    Database(String),

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

/// Filter and pagination for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive substring match on the product name.
    pub keyword: Option<String>,
    /// 1-based page number; page 1 when absent.
    pub page: Option<u64>,
}

/// One page of products plus the collection-wide count.
#[derive(Debug, Clone)]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Total number of products in the store (unfiltered).
    pub product_count: u64,
}

/// Document-store operations consumed by the services.
///
/// Finds return `Ok(None)` for absent records; mutations of a specific record
/// return [`StoreError::NotFound`] when it no longer exists.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the store is reachable (readiness probe).
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a new user.
    ///
    /// Returns [`StoreError::Conflict`] when the email is already registered.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Look up a user by ID.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Look up a user by email address.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// Look up a user by the stored hash of an outstanding reset token.
    ///
    /// Expiry is not checked here; the auth service checks it lazily at
    /// verification time.
    async fn find_user_by_reset_hash(&self, hash: &str) -> Result<Option<User>, StoreError>;

    /// Replace a user record (last-write-wins).
    ///
    /// Returns [`StoreError::Conflict`] when the update would duplicate
    /// another account's email.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    /// Delete a user record.
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    /// List all users (admin view).
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Insert a new product.
    async fn create_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Look up a product by ID.
    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Replace a product record (last-write-wins).
    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Delete a product record.
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;

    /// List products with optional keyword filter and pagination.
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, StoreError>;

    /// Persist a product's reviews together with both derived fields as one
    /// combined update.
    async fn update_product_reviews(
        &self,
        id: ProductId,
        reviews: &[Review],
        ratings: f64,
        num_of_reviews: u32,
    ) -> Result<(), StoreError>;
}
