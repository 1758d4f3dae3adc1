//! Account routes: profile and order history.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use sweet_delights_core::UserId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::order::Order;
use crate::services::AuthService;
use crate::state::AppState;

/// Full profile for the account page.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: UserId,
    pub email: String,
    /// Spins available to spend on the wheel.
    pub spins: i64,
    /// Lifetime spins earned (drives prize tier unlocks).
    pub lifetime_spins: i64,
    pub loyalty_points: i64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Current user's profile, fresh from the database.
///
/// GET /api/account
///
/// # Errors
///
/// Returns `AppError` if the user vanished or the query fails.
pub async fn profile(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<ProfileResponse>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email.to_string(),
        spins: user.spins,
        lifetime_spins: user.lifetime_spins,
        loyalty_points: user.loyalty_points,
        is_admin: user.is_admin,
        created_at: user.created_at,
    }))
}

/// Response wrapper for the order history.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// Current user's orders, newest first.
///
/// GET /api/account/orders
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn orders(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<OrdersResponse>> {
    let orders = crate::db::orders::OrderRepository::new(state.pool())
        .list_for_user(current.id)
        .await?;

    Ok(Json(OrdersResponse { orders }))
}
