//! Cart routes.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use sweet_delights_core::{CartItemId, Money, ProductId};

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::cart::Cart;
use crate::state::AppState;

/// Largest quantity a single line can carry.
const MAX_QUANTITY: i32 = 99;

/// Cart with computed totals.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(flatten)]
    pub cart: Cart,
    pub total: Money,
    pub total_weight_grams: i64,
}

impl CartResponse {
    fn build(cart: Cart) -> Result<Self> {
        let total = cart
            .total()
            .map_err(|e| AppError::Internal(format!("cart total: {e}")))?;
        let total_weight_grams = cart.total_weight_grams();
        Ok(Self {
            cart,
            total,
            total_weight_grams,
        })
    }
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

/// Current cart with totals.
///
/// GET /api/cart
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create(current.id)
        .await?;

    Ok(Json(CartResponse::build(cart)?))
}

/// Request body for adding a product.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Add a product to the cart (merges with an existing line).
///
/// POST /api/cart/items
///
/// # Errors
///
/// Returns `AppError` for unknown/unavailable products or bad quantities.
pub async fn add_item(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>> {
    validate_quantity(req.quantity)?;

    let product = ProductRepository::new(state.pool())
        .get_by_id(req.product_id)
        .await?
        .filter(|p| p.available)
        .ok_or_else(|| AppError::NotFound(format!("product {}", req.product_id)))?;

    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(current.id).await?;
    carts.add_item(cart.id, product.id, req.quantity).await?;

    let cart = carts.get_or_create(current.id).await?;
    Ok(Json(CartResponse::build(cart)?))
}

/// Request body for changing a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Change a line's quantity.
///
/// PATCH /api/cart/items/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if the line isn't in the user's cart.
pub async fn update_item(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(item_id): Path<CartItemId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>> {
    validate_quantity(req.quantity)?;

    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(current.id).await?;
    carts.set_quantity(cart.id, item_id, req.quantity).await?;

    let cart = carts.get_or_create(current.id).await?;
    Ok(Json(CartResponse::build(cart)?))
}

/// Remove a line.
///
/// DELETE /api/cart/items/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if the line isn't in the user's cart.
pub async fn remove_item(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartResponse>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(current.id).await?;
    carts.remove_item(cart.id, item_id).await?;

    let cart = carts.get_or_create(current.id).await?;
    Ok(Json(CartResponse::build(cart)?))
}
