//! Checkout and payment confirmation.
//!
//! Checkout snapshots the cart into an order and hands back a Robokassa
//! payment URL; the confirmation path is shared by the ResultURL callback
//! and by zero-payable orders (fully covered by a certificate), which are
//! confirmed inline.

use sqlx::PgPool;

use sweet_delights_core::{Money, MoneyError, PrizeKind};

use crate::clients::TelegramClient;
use crate::db::RepositoryError;
use crate::db::certificates::CertificateRepository;
use crate::db::users::UserRepository;
use crate::db::wheel::WheelRepository;
use crate::models::order::Order;

/// The money breakdown of an order being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    /// Sum of line subtotals.
    pub item_total: Money,
    /// Discount from an applied wheel prize.
    pub promo_discount: Money,
    /// Delivery cost after any free-shipping prize.
    pub delivery_cost: Money,
    /// Amount the certificate will cover.
    pub certificate_applied: Money,
    /// What goes to Robokassa. Zero means no payment step at all.
    pub payable_total: Money,
}

/// Compute order totals.
///
/// Order of application: percent discounts cut the item total, then
/// delivery is added (zeroed by a free-shipping prize), then the
/// certificate covers as much of the remainder as its balance allows.
///
/// # Errors
///
/// Returns [`MoneyError`] only on decimal overflow; all subtractions here
/// are clamped.
pub fn compute_totals(
    item_total: Money,
    prize: Option<PrizeKind>,
    delivery_cost: Money,
    certificate_balance: Option<Money>,
) -> Result<Totals, MoneyError> {
    let promo_discount = prize
        .and_then(PrizeKind::discount_percent)
        .map_or(Money::ZERO, |pct| item_total.percent(pct));

    let delivery_cost = if prize == Some(PrizeKind::FreeShipping) {
        Money::ZERO
    } else {
        delivery_cost
    };

    let after_discount = item_total.saturating_sub(promo_discount);
    let with_delivery = after_discount.checked_add(delivery_cost)?;

    let certificate_applied = certificate_balance
        .map_or(Money::ZERO, |balance| balance.min(with_delivery));
    let payable_total = with_delivery.saturating_sub(certificate_applied);

    Ok(Totals {
        item_total,
        promo_discount,
        delivery_cost,
        certificate_applied,
        payable_total,
    })
}

/// Finalize a paid order: settle the certificate and promo prize, credit
/// spins and loyalty points, and notify the shop channel.
///
/// The order must already be marked paid (the status flip is the
/// idempotency gate; this function is only reached once per order).
///
/// # Errors
///
/// Returns `RepositoryError` if settlement writes fail. Telegram failures
/// are logged, never returned.
pub async fn settle_paid_order(
    pool: &PgPool,
    telegram: Option<&TelegramClient>,
    order: &Order,
) -> Result<(), RepositoryError> {
    // Draw down the certificate by the amount promised at checkout.
    if let Some(code) = &order.certificate_code
        && !order.certificate_applied.is_zero()
    {
        let code = sweet_delights_core::CertificateCode::parse(code)
            .map_err(|e| RepositoryError::DataCorruption(format!("bad certificate code: {e}")))?;
        match CertificateRepository::new(pool)
            .redeem_up_to(&code, order.certificate_applied)
            .await
        {
            Ok(redeemed) => {
                if redeemed < order.certificate_applied {
                    tracing::warn!(
                        order_id = %order.id,
                        promised = %order.certificate_applied,
                        redeemed = %redeemed,
                        "certificate balance shrank between checkout and payment"
                    );
                }
            }
            Err(RepositoryError::Conflict(reason)) => {
                // The order was honored at the quoted price regardless.
                tracing::warn!(order_id = %order.id, %reason, "certificate no longer redeemable");
            }
            Err(other) => return Err(other),
        }
    }

    // Spend the wheel prize that was applied at checkout.
    if let Some(promo) = &order.promo_code
        && let Ok(promo) = sweet_delights_core::PromoCode::parse(promo)
    {
        let wheel = WheelRepository::new(pool);
        if let Some(prize) = wheel.get_applicable_by_code(order.user_id, &promo).await? {
            match wheel.mark_prize_used(prize.id).await {
                Ok(()) | Err(RepositoryError::Conflict(_)) => {}
                Err(other) => return Err(other),
            }
        }
    }

    // Activate any certificates purchased in this order.
    let activated = CertificateRepository::new(pool)
        .activate_for_order(order.id)
        .await?;
    if activated > 0 {
        tracing::info!(order_id = %order.id, activated, "gift certificates activated");
    }

    // Purchases earn spins and loyalty points.
    UserRepository::new(pool)
        .credit_rewards(order.user_id, order.spins_earned(), order.loyalty_earned())
        .await?;

    // Best-effort shop notification.
    if let Some(telegram) = telegram {
        let text = format!(
            "\u{1f36c} Order #{} paid: {} ({} items, {} delivery)",
            order.id,
            order.payable_total,
            order.items.len(),
            order.delivery_provider.as_str(),
        );
        if let Err(e) = telegram.send_message(&text).await {
            tracing::warn!(order_id = %order.id, error = %e, "telegram notification failed");
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rub(r: u32) -> Money {
        Money::from_rubles(r)
    }

    #[test]
    fn test_totals_plain_order() {
        let totals = compute_totals(rub(1500), None, rub(350), None).unwrap();
        assert_eq!(totals.promo_discount, Money::ZERO);
        assert_eq!(totals.delivery_cost, rub(350));
        assert_eq!(totals.certificate_applied, Money::ZERO);
        assert_eq!(totals.payable_total, rub(1850));
    }

    #[test]
    fn test_totals_percent_discount_cuts_items_only() {
        let totals =
            compute_totals(rub(2000), Some(PrizeKind::DiscountTen), rub(300), None).unwrap();
        assert_eq!(totals.promo_discount, rub(200));
        // delivery is not discounted
        assert_eq!(totals.payable_total, rub(2100));
    }

    #[test]
    fn test_totals_free_shipping_zeroes_delivery() {
        let totals =
            compute_totals(rub(2000), Some(PrizeKind::FreeShipping), rub(300), None).unwrap();
        assert_eq!(totals.promo_discount, Money::ZERO);
        assert_eq!(totals.delivery_cost, Money::ZERO);
        assert_eq!(totals.payable_total, rub(2000));
    }

    #[test]
    fn test_totals_non_discount_prize_changes_nothing() {
        let totals =
            compute_totals(rub(2000), Some(PrizeKind::FreeLollipop), rub(300), None).unwrap();
        assert_eq!(totals.payable_total, rub(2300));
    }

    #[test]
    fn test_totals_certificate_caps_at_balance() {
        let totals = compute_totals(rub(2000), None, rub(300), Some(rub(500))).unwrap();
        assert_eq!(totals.certificate_applied, rub(500));
        assert_eq!(totals.payable_total, rub(1800));
    }

    #[test]
    fn test_totals_certificate_caps_at_order_total() {
        let totals = compute_totals(rub(400), None, Money::ZERO, Some(rub(1000))).unwrap();
        assert_eq!(totals.certificate_applied, rub(400));
        assert_eq!(totals.payable_total, Money::ZERO);
    }

    #[test]
    fn test_totals_discount_and_certificate_compose() {
        // 10% off 1000 -> 900, +200 delivery -> 1100, certificate 1000 -> 100
        let totals = compute_totals(
            rub(1000),
            Some(PrizeKind::DiscountTen),
            rub(200),
            Some(rub(1000)),
        )
        .unwrap();
        assert_eq!(totals.promo_discount, rub(100));
        assert_eq!(totals.certificate_applied, rub(1000));
        assert_eq!(totals.payable_total, rub(100));
    }
}
