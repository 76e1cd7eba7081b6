//! Review aggregation.
//!
//! A product's `ratings` (arithmetic mean) and `num_of_reviews` are derived
//! from its review list and must be recomputed and persisted together with
//! every mutation. The combined write is last-write-wins; concurrent
//! submissions for the same product can overwrite each other's recompute
//! (inherited store contract, see DESIGN.md).

use thiserror::Error;

use bazaar_core::{ProductId, ReviewId, UserId};

use crate::db::{Store, StoreError};
use crate::models::Review;

/// Errors that can occur during review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Rating outside the 1-5 range.
    #[error("rating must be between 1 and 5")]
    InvalidRating,

    /// Product not found.
    #[error("product not found")]
    ProductNotFound,

    /// Store error.
    #[error("database error: {0}")]
    Store(#[from] StoreError),
}

/// Review service.
pub struct ReviewService<'a> {
    store: &'a dyn Store,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create or update the caller's review of a product.
    ///
    /// If the user already reviewed this product the existing entry is
    /// updated in place (count unchanged); otherwise a new entry is appended.
    /// Both derived fields are recomputed and persisted in one combined
    /// update.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` for ratings outside 1-5.
    /// Returns `ReviewError::ProductNotFound` if the product doesn't exist.
    pub async fn upsert(
        &self,
        product_id: ProductId,
        user_id: UserId,
        user_name: &str,
        rating: i64,
        comment: &str,
    ) -> Result<(), ReviewError> {
        let rating = validate_rating(rating)?;

        let product = self
            .store
            .find_product_by_id(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound)?;

        let mut reviews = product.reviews;
        match reviews.iter_mut().find(|r| r.user == user_id) {
            Some(existing) => {
                existing.rating = rating;
                existing.comment = comment.to_owned();
            }
            None => {
                reviews.push(Review::new(
                    user_id,
                    user_name.to_owned(),
                    rating,
                    comment.to_owned(),
                ));
            }
        }

        self.persist(product_id, reviews).await
    }

    /// Delete a review from a product.
    ///
    /// Removing an entry that is already gone is a no-op recompute. Both
    /// derived fields fall back to 0 when the list empties.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` if the product doesn't exist.
    pub async fn remove(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<(), ReviewError> {
        let product = self
            .store
            .find_product_by_id(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound)?;

        let mut reviews = product.reviews;
        reviews.retain(|r| r.id != review_id);

        self.persist(product_id, reviews).await
    }

    /// List all reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` if the product doesn't exist.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewError> {
        let product = self
            .store
            .find_product_by_id(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound)?;
        Ok(product.reviews)
    }

    /// Recompute both derived fields and write them with the review list as
    /// one combined update.
    async fn persist(&self, product_id: ProductId, reviews: Vec<Review>) -> Result<(), ReviewError> {
        let ratings = mean_rating(&reviews);
        let num_of_reviews = u32::try_from(reviews.len()).unwrap_or(u32::MAX);

        self.store
            .update_product_reviews(product_id, &reviews, ratings, num_of_reviews)
            .await?;
        Ok(())
    }
}

/// Validate and narrow a submitted rating.
fn validate_rating(rating: i64) -> Result<u8, ReviewError> {
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::InvalidRating);
    }
    Ok(u8::try_from(rating).unwrap_or(5))
}

/// Arithmetic mean of the ratings; 0 for an empty list.
fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)] // Review counts will never exceed f64 precision
    let count = reviews.len() as f64;
    f64::from(sum) / count
}
