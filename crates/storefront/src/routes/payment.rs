//! Robokassa payment callback.
//!
//! Robokassa POSTs the `ResultURL` as form data after a successful
//! payment and retries until it receives `OK{InvId}` back. Everything
//! here must therefore be idempotent.

use axum::{Form, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;

use sweet_delights_core::OrderId;

use crate::clients::RobokassaClient;
use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::services::checkout::settle_paid_order;
use crate::state::AppState;

/// Robokassa ResultURL parameters (the subset we consume).
#[derive(Debug, Deserialize)]
pub struct ResultParams {
    #[serde(rename = "OutSum")]
    pub out_sum: String,
    #[serde(rename = "InvId")]
    pub inv_id: i64,
    #[serde(rename = "SignatureValue")]
    pub signature_value: String,
}

/// Handle the Robokassa `ResultURL` callback.
///
/// POST /api/payment/result
///
/// Responds with the literal `OK{InvId}` body the gateway expects. A
/// retried callback for an already-paid order is acknowledged without
/// re-settling it.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for bad signatures and
/// `AppError::BadRequest` for amount mismatches.
pub async fn robokassa_result(
    State(state): State<AppState>,
    Form(params): Form<ResultParams>,
) -> Result<String> {
    let order_id = OrderId::new(params.inv_id);

    if !state
        .robokassa()
        .verify_result(&params.out_sum, order_id, &params.signature_value)
    {
        tracing::warn!(%order_id, "robokassa callback with bad signature");
        return Err(AppError::Unauthorized("bad signature".to_owned()));
    }

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    // The signature pins OutSum; still compare against what we quoted
    let reported: Decimal = params
        .out_sum
        .parse()
        .map_err(|_| AppError::BadRequest("bad OutSum".to_owned()))?;
    if reported != order.payable_total.amount() {
        tracing::warn!(
            %order_id,
            reported = %reported,
            expected = %order.payable_total,
            "robokassa amount mismatch"
        );
        return Err(AppError::BadRequest("amount mismatch".to_owned()));
    }

    match orders.mark_paid(order_id).await {
        Ok(()) => {
            let order = orders
                .get_by_id(order_id)
                .await?
                .ok_or_else(|| AppError::Internal("order vanished".to_owned()))?;
            settle_paid_order(state.pool(), state.telegram(), &order).await?;
            tracing::info!(%order_id, "payment confirmed");
        }
        // Retried callback: the order already left pending. Ack it so
        // Robokassa stops retrying; settlement already happened.
        Err(RepositoryError::Conflict(_)) => {
            tracing::info!(%order_id, "duplicate payment callback acknowledged");
        }
        Err(other) => return Err(other.into()),
    }

    Ok(RobokassaClient::result_ack(order_id))
}
