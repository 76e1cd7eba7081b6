//! Product and review domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{ProductId, ReviewId, UserId};

/// A single product review.
///
/// At most one review exists per user per product; re-submitting updates the
/// existing entry in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// Reviewing user.
    pub user: UserId,
    /// Reviewer display name, snapshotted at submission time.
    pub name: String,
    /// Star rating, 1-5.
    pub rating: u8,
    /// Free-text comment.
    pub comment: String,
}

impl Review {
    /// Create a new review with a freshly generated ID.
    #[must_use]
    pub fn new(user: UserId, name: String, rating: u8, comment: String) -> Self {
        Self {
            id: ReviewId::generate(),
            user,
            name,
            rating,
            comment,
        }
    }
}

/// A product (domain type).
///
/// `ratings` and `num_of_reviews` are derived from `reviews` and are
/// recomputed and persisted together with every reviews mutation; they are
/// never trusted independently.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub stock: i64,
    /// Admin user who created the product.
    pub created_by: UserId,
    /// Reviews, ordered by submission.
    pub reviews: Vec<Review>,
    /// Arithmetic mean of `reviews[].rating`; 0 when there are no reviews.
    pub ratings: f64,
    /// Number of reviews (`reviews.len()`).
    pub num_of_reviews: u32,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product with a freshly generated ID and no reviews.
    #[must_use]
    pub fn new(
        name: String,
        description: String,
        price: f64,
        stock: i64,
        created_by: UserId,
    ) -> Self {
        Self {
            id: ProductId::generate(),
            name,
            description,
            price,
            stock,
            created_by,
            reviews: Vec::new(),
            ratings: 0.0,
            num_of_reviews: 0,
            created_at: Utc::now(),
        }
    }
}
