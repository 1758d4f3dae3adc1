//! Gift certificate routes.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sweet_delights_core::{CertificateCode, CertificateStatus, DeliveryProvider, Money};

use crate::db::carts::CartRepository;
use crate::db::certificates::CertificateRepository;
use crate::db::orders::{NewOrder, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Purchasable value bounds, in rubles.
const MIN_VALUE_RUBLES: u32 = 300;
const MAX_VALUE_RUBLES: u32 = 50_000;

/// Purchased certificates stay redeemable for a year.
const VALIDITY_DAYS: i64 = 365;

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub value_rubles: u32,
}

/// Purchase response: the pending certificate and where to pay for it.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Full code; shown once at purchase, masked everywhere else.
    pub code: String,
    pub value: Money,
    pub status: CertificateStatus,
    pub expires_at: DateTime<Utc>,
    pub payment_url: String,
}

/// Buy a gift certificate.
///
/// POST /api/gift-certificates
///
/// Creates a `pending` certificate plus a zero-item order carrying its
/// price; the Robokassa callback activates the certificate when the
/// order is paid.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for out-of-range values.
pub async fn purchase(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>> {
    if !(MIN_VALUE_RUBLES..=MAX_VALUE_RUBLES).contains(&req.value_rubles) {
        return Err(AppError::BadRequest(format!(
            "certificate value must be between {MIN_VALUE_RUBLES} and {MAX_VALUE_RUBLES} rubles"
        )));
    }

    let value = Money::from_rubles(req.value_rubles);

    // A zero-item order carries the payment
    let order = OrderRepository::new(state.pool())
        .create(&NewOrder {
            user_id: current.id,
            items: vec![],
            item_total: value,
            promo_discount: Money::ZERO,
            promo_code: None,
            delivery_provider: DeliveryProvider::Pickup,
            delivery_cost: Money::ZERO,
            certificate_code: None,
            certificate_applied: Money::ZERO,
            payable_total: value,
            recipient_name: current.email.to_string(),
            recipient_phone: String::new(),
            city: String::new(),
            address: String::new(),
        })
        .await?;

    let code = {
        let mut rng = rand::rng();
        CertificateCode::generate(&mut rng)
    };

    let certificate = CertificateRepository::new(state.pool())
        .create(
            &code,
            value,
            CertificateStatus::Pending,
            Some(current.id),
            Some(order.id),
            Utc::now() + Duration::days(VALIDITY_DAYS),
        )
        .await?;

    let payment_url = state.robokassa().payment_url(
        order.id,
        value,
        &format!("Sweet Delights gift certificate {}", code.masked()),
    );

    tracing::info!(user_id = %current.id, order_id = %order.id, "gift certificate purchased");

    Ok(Json(PurchaseResponse {
        code: certificate.code.as_str().to_owned(),
        value: certificate.initial_value,
        status: certificate.status,
        expires_at: certificate.expires_at,
        payment_url: payment_url.to_string(),
    }))
}

/// Balance/status check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    /// Masked code; whoever asks already knows the full one.
    pub code: String,
    pub balance: Money,
    pub initial_value: Money,
    pub status: CertificateStatus,
    pub expires_at: DateTime<Utc>,
}

/// Check a certificate's balance and status.
///
/// GET /api/gift-certificates/{code}
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown codes.
pub async fn check(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CheckResponse>> {
    let code = CertificateCode::parse(&code)
        .map_err(|e| AppError::BadRequest(format!("certificate code: {e}")))?;

    let certificate = CertificateRepository::new(state.pool())
        .get_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("certificate".to_owned()))?;

    Ok(Json(CheckResponse {
        code: certificate.code.masked(),
        balance: certificate.balance,
        initial_value: certificate.initial_value,
        status: certificate.status,
        expires_at: certificate.expires_at,
    }))
}

/// Redemption quote response.
#[derive(Debug, Serialize)]
pub struct RedeemQuoteResponse {
    pub code: String,
    /// How much of the current cart the certificate would cover.
    pub applicable: Money,
    /// What would remain payable.
    pub remainder: Money,
}

/// Quote a certificate against the caller's current cart. The actual
/// draw-down happens when the order's payment is confirmed.
///
/// POST /api/gift-certificates/{code}/redeem
///
/// # Errors
///
/// Returns `AppError::BadRequest` for non-redeemable certificates or an
/// empty cart.
pub async fn redeem_quote(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(code): Path<String>,
) -> Result<Json<RedeemQuoteResponse>> {
    let code = CertificateCode::parse(&code)
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

    let cart = CartRepository::new(state.pool())
        .get_or_create(current.id)
        .await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let total = cart
        .total()
        .map_err(|e| AppError::Internal(format!("cart total: {e}")))?;
    let applicable = certificate.balance.min(total);

    Ok(Json(RedeemQuoteResponse {
        code: certificate.code.masked(),
        applicable,
        remainder: total.saturating_sub(applicable),
    }))
}
