//! Fortune wheel domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sweet_delights_core::{CertificateId, PrizeId, PrizeKind, PromoCode, SpinId, UserId};

/// A prize won on the wheel.
#[derive(Debug, Clone, Serialize)]
pub struct WheelPrize {
    /// Prize ID.
    pub id: PrizeId,
    /// Winner.
    pub user_id: UserId,
    /// What was won.
    pub kind: PrizeKind,
    /// Promo code materializing the prize (discounts, free shipping,
    /// free lollipop, gift box).
    pub promo_code: Option<PromoCode>,
    /// Gift certificate materializing a jackpot.
    pub certificate_id: Option<CertificateId>,
    /// When the prize stops being applicable.
    pub expires_at: DateTime<Utc>,
    /// Whether the prize has been applied to an order.
    pub used: bool,
    /// When it was won.
    pub won_at: DateTime<Utc>,
}

/// One row of the append-only spin log.
#[derive(Debug, Clone, Serialize)]
pub struct SpinRecord {
    /// Spin ID.
    pub id: SpinId,
    /// Who spun.
    pub user_id: UserId,
    /// What the wheel landed on.
    pub kind: PrizeKind,
    /// Lifetime spin count at the moment of the draw (drives tier unlocks).
    pub spins_total: i64,
    /// When the spin happened.
    pub spun_at: DateTime<Utc>,
}
