//! MongoDB store.
//!
//! Document-mapping layer over the official driver. Domain types never leak
//! driver details: documents are separate serde structs converted with
//! `TryFrom`, and driver errors are folded into [`StoreError`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc, to_bson},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, ProductId, ReviewId, Role, UserId};

use super::{ProductPage, ProductQuery, RESULT_PER_PAGE, Store, StoreError};
use crate::models::{Product, Review, User};

/// MongoDB-backed [`Store`] implementation.
pub struct MongoStore {
    db: Database,
    users: Collection<UserDoc>,
    products: Collection<ProductDoc>,
}

impl MongoStore {
    /// Connect to MongoDB and prepare collections and indexes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection or index creation
    /// fails.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await.map_err(map_mongo_err)?;
        let db = client.database(database);
        let users: Collection<UserDoc> = db.collection("users");
        let products: Collection<ProductDoc> = db.collection("products");

        // Unique email index backs the Conflict contract of create/update.
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await
            .map_err(map_mongo_err)?;

        Ok(Self {
            db,
            users,
            products,
        })
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_mongo_err)
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .insert_one(UserDoc::from(user))
            .await
            .map(|_| ())
            .map_err(map_mongo_err)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let doc = self
            .users
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(map_mongo_err)?;
        doc.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let doc = self
            .users
            .find_one(doc! { "email": email.as_str() })
            .await
            .map_err(map_mongo_err)?;
        doc.map(User::try_from).transpose()
    }

    async fn find_user_by_reset_hash(&self, hash: &str) -> Result<Option<User>, StoreError> {
        let doc = self
            .users
            .find_one(doc! { "reset_token_hash": hash })
            .await
            .map_err(map_mongo_err)?;
        doc.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = self
            .users
            .replace_one(doc! { "_id": user.id.to_string() }, UserDoc::from(user))
            .await
            .map_err(map_mongo_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let result = self
            .users
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(map_mongo_err)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let docs: Vec<UserDoc> = self
            .users
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(map_mongo_err)?
            .try_collect()
            .await
            .map_err(map_mongo_err)?;
        docs.into_iter().map(User::try_from).collect()
    }

    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products
            .insert_one(ProductDoc::from(product))
            .await
            .map(|_| ())
            .map_err(map_mongo_err)
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let doc = self
            .products
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(map_mongo_err)?;
        doc.map(Product::try_from).transpose()
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let result = self
            .products
            .replace_one(
                doc! { "_id": product.id.to_string() },
                ProductDoc::from(product),
            )
            .await
            .map_err(map_mongo_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = self
            .products
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(map_mongo_err)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, StoreError> {
        let filter = match &query.keyword {
            Some(kw) => doc! { "name": { "$regex": kw, "$options": "i" } },
            None => doc! {},
        };
        let page = query.page.unwrap_or(1).max(1);
        let limit = i64::try_from(RESULT_PER_PAGE).unwrap_or(i64::MAX);

        let docs: Vec<ProductDoc> = self
            .products
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .skip((page - 1) * RESULT_PER_PAGE)
            .limit(limit)
            .await
            .map_err(map_mongo_err)?
            .try_collect()
            .await
            .map_err(map_mongo_err)?;

        let product_count = self
            .products
            .count_documents(doc! {})
            .await
            .map_err(map_mongo_err)?;

        Ok(ProductPage {
            products: docs
                .into_iter()
                .map(Product::try_from)
                .collect::<Result<_, _>>()?,
            product_count,
        })
    }

    async fn update_product_reviews(
        &self,
        id: ProductId,
        reviews: &[Review],
        ratings: f64,
        num_of_reviews: u32,
    ) -> Result<(), StoreError> {
        let review_docs: Vec<ReviewDoc> = reviews.iter().map(ReviewDoc::from).collect();
        let reviews_bson = to_bson(&review_docs)
            .map_err(|e| StoreError::DataCorruption(format!("failed to serialize reviews: {e}")))?;

        let update: Document = doc! {
            "$set": {
                "reviews": reviews_bson,
                "ratings": ratings,
                "num_of_reviews": i64::from(num_of_reviews),
            }
        };
        let result = self
            .products
            .update_one(doc! { "_id": id.to_string() }, update)
            .await
            .map_err(map_mongo_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Fold a driver error into the store taxonomy.
///
/// Duplicate-key writes (code 11000) become `Conflict` so the unique-email
/// contract surfaces the same way as in the in-memory store.
fn map_mongo_err(err: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&err) {
        return StoreError::Conflict("email already exists".to_owned());
    }
    StoreError::Database(err.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        _ => false,
    }
}

// =============================================================================
// Document types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct UserDoc {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reset_token_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reset_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&User> for UserDoc {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.as_str().to_owned(),
            password_hash: user.password_hash.clone(),
            role: user.role.as_str().to_owned(),
            reset_token_hash: user.reset_token_hash.clone(),
            reset_expires_at: user.reset_expires_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<UserDoc> for User {
    type Error = StoreError;

    fn try_from(doc: UserDoc) -> Result<Self, Self::Error> {
        let id = UserId::parse(&doc.id)
            .map_err(|e| StoreError::DataCorruption(format!("invalid user id in database: {e}")))?;
        let email = Email::parse(&doc.email)
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;
        let role: Role = doc
            .role
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("invalid role in database: {e}")))?;

        Ok(Self {
            id,
            name: doc.name,
            email,
            password_hash: doc.password_hash,
            role,
            reset_token_hash: doc.reset_token_hash,
            reset_expires_at: doc.reset_expires_at,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReviewDoc {
    id: String,
    user: String,
    name: String,
    rating: i32,
    comment: String,
}

impl From<&Review> for ReviewDoc {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.to_string(),
            user: review.user.to_string(),
            name: review.name.clone(),
            rating: i32::from(review.rating),
            comment: review.comment.clone(),
        }
    }
}

impl TryFrom<ReviewDoc> for Review {
    type Error = StoreError;

    fn try_from(doc: ReviewDoc) -> Result<Self, Self::Error> {
        let id = ReviewId::parse(&doc.id).map_err(|e| {
            StoreError::DataCorruption(format!("invalid review id in database: {e}"))
        })?;
        let user = UserId::parse(&doc.user).map_err(|e| {
            StoreError::DataCorruption(format!("invalid review user in database: {e}"))
        })?;
        let rating = u8::try_from(doc.rating).map_err(|_| {
            StoreError::DataCorruption(format!("invalid rating in database: {}", doc.rating))
        })?;

        Ok(Self {
            id,
            user,
            name: doc.name,
            rating,
            comment: doc.comment,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProductDoc {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    description: String,
    price: f64,
    stock: i64,
    created_by: String,
    reviews: Vec<ReviewDoc>,
    ratings: f64,
    num_of_reviews: i64,
    created_at: DateTime<Utc>,
}

impl From<&Product> for ProductDoc {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            created_by: product.created_by.to_string(),
            reviews: product.reviews.iter().map(ReviewDoc::from).collect(),
            ratings: product.ratings,
            num_of_reviews: i64::from(product.num_of_reviews),
            created_at: product.created_at,
        }
    }
}

impl TryFrom<ProductDoc> for Product {
    type Error = StoreError;

    fn try_from(doc: ProductDoc) -> Result<Self, Self::Error> {
        let id = ProductId::parse(&doc.id).map_err(|e| {
            StoreError::DataCorruption(format!("invalid product id in database: {e}"))
        })?;
        let created_by = UserId::parse(&doc.created_by).map_err(|e| {
            StoreError::DataCorruption(format!("invalid product creator in database: {e}"))
        })?;
        let num_of_reviews = u32::try_from(doc.num_of_reviews).map_err(|_| {
            StoreError::DataCorruption(format!(
                "invalid review count in database: {}",
                doc.num_of_reviews
            ))
        })?;

        Ok(Self {
            id,
            name: doc.name,
            description: doc.description,
            price: doc.price,
            stock: doc.stock,
            created_by,
            reviews: doc
                .reviews
                .into_iter()
                .map(Review::try_from)
                .collect::<Result<_, _>>()?,
            ratings: doc.ratings,
            num_of_reviews,
            created_at: doc.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_doc_roundtrip() {
        let user = User::new(
            "Ada".to_owned(),
            Email::parse("ada@example.com").unwrap(),
            "$argon2id$fake".to_owned(),
        );
        let doc = UserDoc::from(&user);
        let back = User::try_from(doc).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.email, user.email);
        assert_eq!(back.role, user.role);
    }

    #[test]
    fn test_user_doc_rejects_bad_role() {
        let user = User::new(
            "Ada".to_owned(),
            Email::parse("ada@example.com").unwrap(),
            "hash".to_owned(),
        );
        let mut doc = UserDoc::from(&user);
        doc.role = "superuser".to_owned();
        assert!(matches!(
            User::try_from(doc),
            Err(StoreError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_product_doc_roundtrip_with_reviews() {
        let mut product = Product::new(
            "Keyboard".to_owned(),
            "Clicky".to_owned(),
            59.99,
            3,
            UserId::generate(),
        );
        product.reviews.push(Review::new(
            UserId::generate(),
            "Ada".to_owned(),
            4,
            "Good".to_owned(),
        ));
        product.num_of_reviews = 1;
        product.ratings = 4.0;

        let doc = ProductDoc::from(&product);
        let back = Product::try_from(doc).unwrap();
        assert_eq!(back.id, product.id);
        assert_eq!(back.reviews, product.reviews);
        assert_eq!(back.num_of_reviews, 1);
    }
}
