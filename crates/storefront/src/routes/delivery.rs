//! Delivery quote routes.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use sweet_delights_core::{DeliveryProvider, Money};

use crate::clients::DeliveryQuote;
use crate::db::carts::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::state::AppState;

/// Delivery calculation request.
///
/// Weight defaults to the caller's cart when logged in.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    /// CDEK destination city code.
    pub city_code: Option<i32>,
    /// Street address for Yandex Delivery.
    pub address: Option<String>,
    /// Override weight in grams (e.g. while browsing logged out).
    pub weight_grams: Option<i64>,
}

/// Delivery calculation response.
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub quotes: Vec<DeliveryQuote>,
}

/// Quote delivery options across providers.
///
/// POST /api/delivery/calculate
///
/// Pickup is always offered; CDEK needs `city_code`, Yandex Delivery
/// needs `address`. A provider failing to quote is logged and skipped,
/// not fatal.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when there is nothing to weigh.
pub async fn calculate(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>> {
    let weight_grams = match req.weight_grams {
        Some(weight) if weight > 0 => weight,
        Some(_) => return Err(AppError::BadRequest("weight must be positive".to_owned())),
        None => {
            let Some(current) = current else {
                return Err(AppError::BadRequest(
                    "weight_grams is required when not logged in".to_owned(),
                ));
            };
            let cart = CartRepository::new(state.pool())
                .get_or_create(current.id)
                .await?;
            if cart.is_empty() {
                return Err(AppError::BadRequest("cart is empty".to_owned()));
            }
            cart.total_weight_grams()
        }
    };

    let mut quotes = vec![DeliveryQuote {
        provider: DeliveryProvider::Pickup,
        tariff: "Самовывоз".to_owned(),
        cost: Money::ZERO,
        min_days: Some(0),
        max_days: Some(0),
    }];

    let cdek_future = async {
        match req.city_code {
            Some(city_code) => Some(state.cdek().calculate(city_code, weight_grams).await),
            None => None,
        }
    };
    let yandex_future = async {
        match req.address.as_deref() {
            Some(address) if !address.trim().is_empty() => {
                Some(state.yandex_delivery().calculate(address, weight_grams).await)
            }
            _ => None,
        }
    };

    let (cdek_result, yandex_result) = tokio::join!(cdek_future, yandex_future);

    match cdek_result {
        Some(Ok(cdek_quotes)) => quotes.extend(cdek_quotes),
        Some(Err(e)) => tracing::warn!(error = %e, "CDEK quote failed"),
        None => {}
    }

    match yandex_result {
        Some(Ok(quote)) => quotes.push(quote),
        Some(Err(e)) => tracing::warn!(error = %e, "Yandex Delivery quote failed"),
        None => {}
    }

    Ok(Json(CalculateResponse { quotes }))
}
