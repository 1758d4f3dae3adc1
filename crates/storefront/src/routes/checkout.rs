//! Checkout and order routes.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use sweet_delights_core::{
    CertificateCode, DeliveryProvider, Money, OrderId, PromoCode,
};

use crate::clients::cdek::OrderStatusEntry;
use crate::db::carts::CartRepository;
use crate::db::orders::{NewOrder, NewOrderItem, OrderRepository};
use crate::db::wheel::WheelRepository;
use crate::db::certificates::CertificateRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::order::Order;
use crate::services::checkout::{compute_totals, settle_paid_order};
use crate::state::AppState;

/// Checkout request.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub delivery_provider: DeliveryProvider,
    /// CDEK destination city code (required for CDEK).
    pub city_code: Option<i32>,
    /// Wheel prize promo code to apply.
    pub promo_code: Option<String>,
    /// Gift certificate code to apply.
    pub certificate_code: Option<String>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub city: String,
    /// Street address (ignored for pickup).
    #[serde(default)]
    pub address: String,
}

/// Checkout response: the created order plus where to pay for it.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Robokassa payment URL; absent when a certificate covered the
    /// whole order and it is already paid.
    pub payment_url: Option<String>,
}

/// Quote the delivery cost for the chosen provider, server-side; client
/// supplied costs are never trusted.
async fn quote_delivery(
    state: &AppState,
    req: &CheckoutRequest,
    weight_grams: i64,
) -> Result<Money> {
    match req.delivery_provider {
        DeliveryProvider::Pickup => Ok(Money::ZERO),
        DeliveryProvider::Cdek => {
            let city_code = req.city_code.ok_or_else(|| {
                AppError::BadRequest("city_code is required for CDEK delivery".to_owned())
            })?;
            let quotes = state.cdek().calculate(city_code, weight_grams).await?;
            quotes
                .iter()
                .map(|quote| quote.cost)
                .min()
                .ok_or_else(|| AppError::BadRequest("CDEK has no tariff to this city".to_owned()))
        }
        DeliveryProvider::YandexDelivery => {
            if req.address.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "address is required for Yandex Delivery".to_owned(),
                ));
            }
            let destination = format!("{}, {}", req.city, req.address);
            let quote = state
                .yandex_delivery()
                .calculate(&destination, weight_grams)
                .await?;
            Ok(quote.cost)
        }
    }
}

/// Place an order from the current cart.
///
/// POST /api/checkout
///
/// # Errors
///
/// Returns `AppError` for empty carts, inapplicable promos/certificates,
/// or delivery/database failures.
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    if req.recipient_name.trim().is_empty() || req.recipient_phone.trim().is_empty() {
        return Err(AppError::BadRequest(
            "recipient name and phone are required".to_owned(),
        ));
    }

    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(current.id).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let item_total = cart
        .total()
        .map_err(|e| AppError::Internal(format!("cart total: {e}")))?;

    // Resolve the wheel prize, if one is being applied
    let prize = match &req.promo_code {
        Some(raw) => {
            let code = PromoCode::parse(raw)
                .map_err(|e| AppError::BadRequest(format!("promo code: {e}")))?;
            let prize = WheelRepository::new(state.pool())
                .get_applicable_by_code(current.id, &code)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest("promo code is not applicable".to_owned())
                })?;
            Some(prize)
        }
        None => None,
    };

    // Resolve the certificate, if one is being applied
    let certificate = match &req.certificate_code {
        Some(raw) => {
            let code = CertificateCode::parse(raw)
                .map_err(|e| AppError::BadRequest(format!("certificate code: {e}")))?;
            let certificate = CertificateRepository::new(state.pool())
                .get_by_code(&code)
                .await?
                .ok_or_else(|| AppError::NotFound("certificate".to_owned()))?;
            if !certificate.is_redeemable(Utc::now()) {
                return Err(AppError::BadRequest(
                    "certificate is not redeemable".to_owned(),
                ));
            }
            Some(certificate)
        }
        None => None,
    };

    let delivery_cost = quote_delivery(&state, &req, cart.total_weight_grams()).await?;

    let totals = compute_totals(
        item_total,
        prize.as_ref().map(|p| p.kind),
        delivery_cost,
        certificate.as_ref().map(|c| c.balance),
    )
    .map_err(|e| AppError::Internal(format!("totals: {e}")))?;

    let items = cart
        .items
        .iter()
        .map(|item| NewOrderItem {
            product_id: item.product_id,
            title: item.title.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
        })
        .collect();

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .create(&NewOrder {
            user_id: current.id,
            items,
            item_total: totals.item_total,
            promo_discount: totals.promo_discount,
            promo_code: prize
                .as_ref()
                .and_then(|p| p.promo_code.as_ref())
                .map(|c| c.as_str().to_owned()),
            delivery_provider: req.delivery_provider,
            delivery_cost: totals.delivery_cost,
            certificate_code: certificate
                .as_ref()
                .map(|c| c.code.as_str().to_owned()),
            certificate_applied: totals.certificate_applied,
            payable_total: totals.payable_total,
            recipient_name: req.recipient_name.trim().to_owned(),
            recipient_phone: req.recipient_phone.trim().to_owned(),
            city: req.city.trim().to_owned(),
            address: req.address.trim().to_owned(),
        })
        .await?;

    carts.clear(cart.id).await?;
    tracing::info!(order_id = %order.id, total = %order.payable_total, "order placed");

    // Fully covered by the certificate: no payment step
    if order.payable_total.is_zero() {
        orders.mark_paid(order.id).await?;
        let order = orders
            .get_by_id(order.id)
            .await?
            .ok_or_else(|| AppError::Internal("order vanished".to_owned()))?;
        settle_paid_order(state.pool(), state.telegram(), &order).await?;

        return Ok(Json(CheckoutResponse {
            order,
            payment_url: None,
        }));
    }

    let payment_url = state.robokassa().payment_url(
        order.id,
        order.payable_total,
        &format!("Sweet Delights order #{}", order.id),
    );

    Ok(Json(CheckoutResponse {
        payment_url: Some(payment_url.to_string()),
        order,
    }))
}

/// Order status for the buyer.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` unless the order belongs to the caller.
pub async fn order_status(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(order_id, current.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    Ok(Json(order))
}

/// Tracking response.
#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub order_id: OrderId,
    /// CDEK tracking events, oldest first; empty when CDEK doesn't know
    /// the parcel yet.
    pub events: Vec<OrderStatusEntry>,
}

/// CDEK tracking proxy for an order.
///
/// GET /api/orders/{id}/tracking
///
/// # Errors
///
/// Returns `AppError::NotFound` unless the order belongs to the caller;
/// `AppError::BadRequest` for orders not shipped via CDEK.
pub async fn order_tracking(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<TrackingResponse>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(order_id, current.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if order.delivery_provider != DeliveryProvider::Cdek {
        return Err(AppError::BadRequest(
            "tracking is only available for CDEK orders".to_owned(),
        ));
    }

    let events = state
        .cdek()
        .track(&order.id.to_string())
        .await?
        .unwrap_or_default();

    Ok(Json(TrackingResponse {
        order_id: order.id,
        events,
    }))
}
