//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the DB)
//!
//! # Auth (strict rate limit)
//! POST /api/auth/register               - Create account, start session
//! POST /api/auth/login                  - Start session
//! POST /api/auth/logout                 - End session
//!
//! # Account (requires auth)
//! GET  /api/account                     - Profile, spins, loyalty points
//! GET  /api/account/orders              - Order history
//!
//! # Catalog
//! GET  /api/products                    - Listing (?category=&page=)
//! GET  /api/products/{handle}           - Product detail
//!
//! # Cart (requires auth)
//! GET    /api/cart                      - Current cart with totals
//! POST   /api/cart/items                - Add a product
//! PATCH  /api/cart/items/{id}           - Change quantity
//! DELETE /api/cart/items/{id}           - Remove a line
//!
//! # Checkout & payment
//! POST /api/checkout                    - Cart -> order + payment URL
//! POST /api/payment/result              - Robokassa ResultURL callback
//! GET  /api/orders/{id}                 - Order status
//! GET  /api/orders/{id}/tracking        - CDEK tracking proxy
//!
//! # Delivery
//! POST /api/delivery/calculate          - CDEK + Yandex Delivery quotes
//!
//! # Fortune wheel (requires auth; spin is rate limited)
//! GET  /api/wheel/prizes                - Tier table with unlock state
//! POST /api/wheel/spin                  - Consume a spin, draw a prize
//! GET  /api/wheel/history               - Past spins
//!
//! # Gift certificates
//! POST /api/gift-certificates           - Purchase (pending + payment URL)
//! GET  /api/gift-certificates/{code}    - Balance/status check
//! POST /api/gift-certificates/{code}/redeem - Quote against current cart
//!
//! # Admin (requires admin)
//! GET/POST /api/admin/products, PATCH /api/admin/products/{id}
//! GET  /api/admin/orders, PATCH /api/admin/orders/{id}/status
//! GET  /api/admin/certificates
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod certificates;
pub mod checkout;
pub mod delivery;
pub mod payment;
pub mod products;
pub mod wheel;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, spin_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router (strictly rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile))
        .route("/orders", get(account::orders))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the wheel routes router; the spin endpoint gets its own limiter.
pub fn wheel_routes() -> Router<AppState> {
    let spin = Router::new()
        .route("/spin", post(wheel::spin))
        .layer(spin_rate_limiter());

    Router::new()
        .route("/prizes", get(wheel::prizes))
        .route("/history", get(wheel::history))
        .merge(spin)
}

/// Create the gift certificate routes router.
pub fn certificate_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(certificates::purchase))
        .route("/{code}", get(certificates::check))
        .route("/{code}/redeem", post(certificates::redeem_quote))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route("/products/{id}", patch(admin::update_product))
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", patch(admin::update_order_status))
        .route("/certificates", get(admin::list_certificates))
}

/// Create all routes for the storefront.
///
/// Auth carries its own strict limiter; everything else under `/api`
/// shares the relaxed one. Health endpoints live outside `routes()` and
/// are never rate limited.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/api/account", account_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/payment/result", post(payment::robokassa_result))
        .route("/api/orders/{id}", get(checkout::order_status))
        .route("/api/orders/{id}/tracking", get(checkout::order_tracking))
        .route("/api/delivery/calculate", post(delivery::calculate))
        .nest("/api/wheel", wheel_routes())
        .nest("/api/gift-certificates", certificate_routes())
        .nest("/api/admin", admin_routes())
        .layer(api_rate_limiter());

    Router::new().nest("/api/auth", auth_routes()).merge(api)
}
