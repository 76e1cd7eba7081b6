//! In-memory store.
//!
//! Backs the integration tests and local development. Enforces the same
//! contracts as the MongoDB implementation: unique emails, last-write-wins
//! updates, combined derived-field writes for reviews.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use bazaar_core::{Email, ProductId, UserId};

use super::{ProductPage, ProductQuery, RESULT_PER_PAGE, Store, StoreError};
use crate::models::{Product, Review, User};

/// In-memory [`Store`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    products: RwLock<HashMap<ProductId, Product>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_user_by_reset_hash(&self, hash: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(hash))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(StoreError::NotFound);
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, StoreError> {
        let products = self.products.read().await;
        let product_count = products.len() as u64;

        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| match &query.keyword {
                Some(kw) => p.name.to_lowercase().contains(&kw.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.as_uuid().cmp(&b.id.as_uuid())));

        let page = query.page.unwrap_or(1).max(1);
        let products = matched
            .into_iter()
            .skip(usize::try_from((page - 1) * RESULT_PER_PAGE).unwrap_or(usize::MAX))
            .take(usize::try_from(RESULT_PER_PAGE).unwrap_or(usize::MAX))
            .collect();

        Ok(ProductPage {
            products,
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
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(StoreError::NotFound)?;
        product.reviews = reviews.to_vec();
        product.ratings = ratings;
        product.num_of_reviews = num_of_reviews;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(
            "Test".to_owned(),
            Email::parse(email).unwrap(),
            "hash".to_owned(),
        )
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.create_user(&user("a@example.com")).await.unwrap();

        let result = store.create_user(&user("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_user_rejects_foreign_email() {
        let store = MemoryStore::new();
        store.create_user(&user("a@example.com")).await.unwrap();
        let mut second = user("b@example.com");
        store.create_user(&second).await.unwrap();

        second.email = Email::parse("a@example.com").unwrap();
        let result = store.update_user(&second).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_user_by_reset_hash() {
        let store = MemoryStore::new();
        let mut u = user("a@example.com");
        u.set_reset_token("deadbeef".to_owned(), chrono::Utc::now());
        store.create_user(&u).await.unwrap();

        let found = store.find_user_by_reset_hash("deadbeef").await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(u.id));
        assert!(store.find_user_by_reset_hash("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let result = store.delete_user(UserId::generate()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_products_paginates_and_filters() {
        let store = MemoryStore::new();
        let admin = UserId::generate();
        for i in 0..7 {
            let p = Product::new(format!("Widget {i}"), String::new(), 1.0, 1, admin);
            store.create_product(&p).await.unwrap();
        }
        let gadget = Product::new("Gadget".to_owned(), String::new(), 1.0, 1, admin);
        store.create_product(&gadget).await.unwrap();

        let page1 = store.list_products(&ProductQuery::default()).await.unwrap();
        assert_eq!(page1.products.len(), 5);
        assert_eq!(page1.product_count, 8);

        let page2 = store
            .list_products(&ProductQuery {
                keyword: None,
                page: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page2.products.len(), 3);

        let filtered = store
            .list_products(&ProductQuery {
                keyword: Some("gad".to_owned()),
                page: None,
            })
            .await
            .unwrap();
        assert_eq!(filtered.products.len(), 1);
        assert_eq!(filtered.products.first().unwrap().name, "Gadget");
    }
}
