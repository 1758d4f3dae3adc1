//! Fortune wheel routes.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use sweet_delights_core::PrizeKind;

use crate::db::wheel::WheelRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::wheel::SpinRecord;
use crate::services::AuthService;
use crate::services::wheel::{PRIZE_TABLE, available_prizes, draw_prize, effective_spins, materialize};
use crate::state::AppState;

/// How many history rows the API returns.
const HISTORY_LIMIT: i64 = 50;

/// One wheel slot with its unlock state for the current user.
#[derive(Debug, Serialize)]
pub struct TierResponse {
    pub kind: PrizeKind,
    pub label: &'static str,
    pub min_spins: u32,
    pub unlocked: bool,
}

/// The wheel as the current user sees it.
#[derive(Debug, Serialize)]
pub struct WheelResponse {
    /// Spins available to spend.
    pub spins: i64,
    /// Lifetime spins earned (drives unlocks).
    pub lifetime_spins: i64,
    pub tiers: Vec<TierResponse>,
}

/// The wheel tier table with the caller's unlock state.
///
/// GET /api/wheel/prizes
///
/// # Errors
///
/// Returns `AppError` if the user lookup fails.
pub async fn prizes(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<WheelResponse>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    let effective = effective_spins(user.lifetime_spins);
    let unlocked_count = available_prizes(effective).len();

    let tiers = PRIZE_TABLE
        .iter()
        .enumerate()
        .map(|(index, tier)| TierResponse {
            kind: tier.kind,
            label: tier.kind.label(),
            min_spins: tier.min_spins,
            unlocked: index < unlocked_count,
        })
        .collect();

    Ok(Json(WheelResponse {
        spins: user.spins,
        lifetime_spins: user.lifetime_spins,
        tiers,
    }))
}

/// A spin's outcome.
#[derive(Debug, Serialize)]
pub struct SpinResponse {
    pub kind: PrizeKind,
    pub label: &'static str,
    /// Promo code to use at checkout (all prizes except the jackpot).
    pub promo_code: Option<String>,
    /// Gift certificate code (jackpot only).
    pub certificate_code: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Spins remaining after this one.
    pub spins_left: i64,
}

/// Spend one spin and draw a prize.
///
/// POST /api/wheel/spin
///
/// # Errors
///
/// Returns `AppError::Conflict` when the caller has no spins left.
pub async fn spin(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<SpinResponse>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    if user.spins < 1 {
        return Err(AppError::Conflict("no spins available".to_owned()));
    }

    // The RNG must not live across an await: draw and materialize in one
    // synchronous block, then persist.
    let drawn = {
        let mut rng = rand::rng();
        let kind = draw_prize(effective_spins(user.lifetime_spins), &mut rng);
        materialize(kind, Utc::now(), &mut rng)
    };

    let certificate_code = drawn
        .certificate
        .as_ref()
        .map(|(code, _)| code.as_str().to_owned());

    let prize = WheelRepository::new(state.pool())
        .execute_spin(current.id, &drawn)
        .await?;

    tracing::info!(user_id = %current.id, kind = prize.kind.as_str(), "wheel spin");

    Ok(Json(SpinResponse {
        kind: prize.kind,
        label: prize.kind.label(),
        promo_code: prize.promo_code.map(|c| c.as_str().to_owned()),
        certificate_code,
        expires_at: prize.expires_at,
        spins_left: user.spins - 1,
    }))
}

/// Response wrapper for spin history.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub spins: Vec<SpinRecord>,
}

/// The caller's spin history, newest first.
///
/// GET /api/wheel/history
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn history(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<HistoryResponse>> {
    let spins = WheelRepository::new(state.pool())
        .history(current.id, HISTORY_LIMIT)
        .await?;

    Ok(Json(HistoryResponse { spins }))
}
