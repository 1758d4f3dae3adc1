//! Admin routes: catalog management, order fulfilment, certificate list.
//!
//! Everything here requires the `RequireAdmin` extractor; the admin flag
//! is granted via the CLI.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sweet_delights_core::{
    CertificateId, CertificateStatus, Money, OrderId, OrderStatus, ProductId,
};

use crate::db::certificates::CertificateRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::{NewProduct, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::Order;
use crate::models::product::Product;
use crate::state::AppState;

/// Default page size for admin lists.
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Products
// ============================================================================

/// Response wrapper for the product list.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// Every product, unavailable ones included.
///
/// GET /api/admin/products
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ProductsResponse>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(ProductsResponse { products }))
}

/// Product fields for create/update.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub handle: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub weight_grams: i32,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl ProductRequest {
    fn validate(&self) -> Result<NewProduct> {
        let handle = self.handle.trim().to_lowercase();
        if handle.is_empty()
            || !handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(AppError::BadRequest(
                "handle must be non-empty and URL-safe (a-z, 0-9, '-')".to_owned(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("title is required".to_owned()));
        }
        if self.weight_grams <= 0 {
            return Err(AppError::BadRequest("weight must be positive".to_owned()));
        }

        Ok(NewProduct {
            handle,
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            category: self.category.trim().to_lowercase(),
            price: self.price,
            weight_grams: self.weight_grams,
            available: self.available,
        })
    }
}

/// Add a product to the catalog.
///
/// POST /api/admin/products
///
/// # Errors
///
/// Returns `AppError` on validation failure or handle collision.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let new_product = req.validate()?;
    let product = ProductRepository::new(state.pool())
        .create(&new_product)
        .await?;

    tracing::info!(admin = %admin.email, handle = %product.handle, "product created");
    Ok(Json(product))
}

/// Update a product.
///
/// PATCH /api/admin/products/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown products.
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let new_product = req.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &new_product)
        .await?;

    tracing::info!(admin = %admin.email, handle = %product.handle, "product updated");
    Ok(Json(product))
}

// ============================================================================
// Orders
// ============================================================================

/// Query parameters for the order list.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub limit: Option<i64>,
}

/// Response wrapper for the order list.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// Recent orders across all users.
///
/// GET /api/admin/orders?limit=
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrdersResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);
    let orders = OrderRepository::new(state.pool()).list_recent(limit).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Move an order through its lifecycle.
///
/// PATCH /api/admin/orders/{id}/status
///
/// # Errors
///
/// Returns `AppError::BadRequest` for illegal transitions and
/// `AppError::Conflict` when racing another change.
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if !order.status.can_transition_to(req.status) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {} to {}",
            order.status.as_str(),
            req.status.as_str()
        )));
    }

    orders.transition_status(id, order.status, req.status).await?;
    tracing::info!(
        admin = %admin.email,
        order_id = %id,
        from = order.status.as_str(),
        to = req.status.as_str(),
        "order status changed"
    );

    let order = orders
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::Internal("order vanished".to_owned()))?;
    Ok(Json(order))
}

// ============================================================================
// Certificates
// ============================================================================

/// A certificate row with the code masked.
#[derive(Debug, Serialize)]
pub struct CertificateSummary {
    pub id: CertificateId,
    pub code_masked: String,
    pub initial_value: Money,
    pub balance: Money,
    pub status: CertificateStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Response wrapper for the certificate list.
#[derive(Debug, Serialize)]
pub struct CertificatesResponse {
    pub certificates: Vec<CertificateSummary>,
}

/// Recent certificates, codes masked.
///
/// GET /api/admin/certificates
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn list_certificates(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<CertificatesResponse>> {
    let certificates = CertificateRepository::new(state.pool())
        .list_recent(DEFAULT_LIMIT)
        .await?;

    let certificates = certificates
        .into_iter()
        .map(|c| CertificateSummary {
            id: c.id,
            code_masked: c.code.masked(),
            initial_value: c.initial_value,
            balance: c.balance,
            status: c.status,
            expires_at: c.expires_at,
            created_at: c.created_at,
        })
        .collect();

    Ok(Json(CertificatesResponse { certificates }))
}
