//! Catalog routes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::product::Product;
use crate::state::AppState;

/// Query parameters for the listing.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    /// Zero-based page.
    #[serde(default)]
    pub page: i64,
}

/// Response wrapper for the catalog listing.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub products: Vec<Product>,
    pub page: i64,
}

/// Catalog listing, optionally filtered by category.
///
/// GET /api/products?category=&page=
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingResponse>> {
    let products = ProductRepository::new(state.pool())
        .list_available(query.category.as_deref(), query.page)
        .await?;

    Ok(Json(ListingResponse {
        products,
        page: query.page.max(0),
    }))
}

/// Product detail by handle.
///
/// GET /api/products/{handle}
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown or unavailable products.
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_handle(&handle)
        .await?
        .filter(|p| p.available)
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))?;

    Ok(Json(product))
}
