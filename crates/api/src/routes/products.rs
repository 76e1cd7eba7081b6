//! Product and review route handlers.
//!
//! Product CRUD is thin glue over the store; the review handlers delegate to
//! the aggregator so the derived rating fields stay consistent with every
//! mutation.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use bazaar_core::{ProductId, ReviewId};

use crate::db::{ProductQuery, StoreError};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::Product;
use crate::routes::require_field;
use crate::state::AppState;

// =============================================================================
// Body and Query Types
// =============================================================================

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub keyword: Option<String>,
    pub page: Option<u64>,
}

/// Product creation body.
#[derive(Debug, Deserialize)]
pub struct CreateProductBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

/// Product update body: any subset of the creation fields.
#[derive(Debug, Deserialize)]
pub struct UpdateProductBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

/// Review upsert body.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub product_id: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// Review listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub id: Option<String>,
}

/// Review deletion query parameters.
#[derive(Debug, Deserialize)]
pub struct ReviewDeleteQuery {
    pub product_id: Option<String>,
    pub id: Option<String>,
}

// =============================================================================
// Product Handlers
// =============================================================================

/// List products with optional keyword filter and pagination.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let page = state
        .store()
        .list_products(&ProductQuery {
            keyword: query.keyword,
            page: query.page,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "products": page.products,
        "product_count": page.product_count,
    }))
    .into_response())
}

/// Get a single product.
pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let product_id = ProductId::parse(&id)?;
    let product = state
        .store()
        .find_product_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    Ok(Json(json!({
        "success": true,
        "product": product,
    }))
    .into_response())
}

/// Create a product (admin).
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateProductBody>,
) -> Result<Response> {
    let name = require_field(body.name, "Please enter product name, description and price")?;
    let description = require_field(
        body.description,
        "Please enter product name, description and price",
    )?;
    let price = require_field(body.price, "Please enter product name, description and price")?;
    let stock = body.stock.unwrap_or(1);

    let product = Product::new(name, description, price, stock, admin.id);
    state.store().create_product(&product).await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "product": product,
        })),
    )
        .into_response())
}

/// Update a product (admin).
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductBody>,
) -> Result<Response> {
    let product_id = ProductId::parse(&id)?;
    let mut product = state
        .store()
        .find_product_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(description) = body.description {
        product.description = description;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }

    state.store().update_product(&product).await?;

    Ok(Json(json!({
        "success": true,
        "product": product,
    }))
    .into_response())
}

/// Delete a product (admin).
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response> {
    let product_id = ProductId::parse(&id)?;

    state
        .store()
        .delete_product(product_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("Product not found".to_owned()),
            other => AppError::Store(other),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Product deleted successfully",
    }))
    .into_response())
}

// =============================================================================
// Review Handlers
// =============================================================================

/// Create or update the caller's review of a product.
pub async fn upsert_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ReviewBody>,
) -> Result<Response> {
    let product_id = require_field(body.product_id, "Please provide product_id and rating")?;
    let rating = require_field(body.rating, "Please provide product_id and rating")?;
    let comment = body.comment.unwrap_or_default();

    let product_id = ProductId::parse(&product_id)?;
    state
        .reviews()
        .upsert(product_id, user.id, &user.name, rating, &comment)
        .await?;

    Ok(Json(json!({ "success": true })).into_response())
}

/// List all reviews of a product.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Response> {
    let id = require_field(query.id, "Please provide a product id")?;
    let product_id = ProductId::parse(&id)?;

    let reviews = state.reviews().list(product_id).await?;

    Ok(Json(json!({
        "success": true,
        "reviews": reviews,
    }))
    .into_response())
}

/// Delete a review from a product.
pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ReviewDeleteQuery>,
) -> Result<Response> {
    let product_id = require_field(query.product_id, "Please provide product_id and review id")?;
    let review_id = require_field(query.id, "Please provide product_id and review id")?;

    let product_id = ProductId::parse(&product_id)?;
    let review_id = ReviewId::parse(&review_id)?;

    state.reviews().remove(product_id, review_id).await?;

    Ok(Json(json!({ "success": true })).into_response())
}
