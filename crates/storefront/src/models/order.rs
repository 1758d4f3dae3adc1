//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sweet_delights_core::{
    DeliveryProvider, Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId,
};

/// A line in an order. Prices are snapshotted at checkout and never change
/// afterwards, whatever happens to the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// Line ID.
    pub id: OrderItemId,
    /// Product at checkout time (may since be archived).
    pub product_id: ProductId,
    /// Product title at checkout time.
    pub title: String,
    /// Unit price at checkout time.
    pub unit_price: Money,
    /// Quantity.
    pub quantity: i32,
}

/// An order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Order ID; also the public order number and the Robokassa invoice ID.
    pub id: OrderId,
    /// Buyer.
    pub user_id: UserId,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Lines.
    pub items: Vec<OrderItem>,
    /// Sum of line subtotals before discounts.
    pub item_total: Money,
    /// Promo discount applied from a wheel prize, if any.
    pub promo_discount: Money,
    /// Promo code that produced the discount, if any.
    pub promo_code: Option<String>,
    /// Delivery provider chosen at checkout.
    pub delivery_provider: DeliveryProvider,
    /// Delivery cost (zero for pickup or a free-shipping prize).
    pub delivery_cost: Money,
    /// Gift certificate code applied, if any.
    pub certificate_code: Option<String>,
    /// Amount covered by the certificate.
    pub certificate_applied: Money,
    /// What the customer actually pays via Robokassa.
    pub payable_total: Money,
    /// Recipient name.
    pub recipient_name: String,
    /// Recipient phone.
    pub recipient_phone: String,
    /// Destination city.
    pub city: String,
    /// Street address (empty for pickup).
    pub address: String,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the payment was confirmed.
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    fn whole_rubles(&self) -> i64 {
        use rust_decimal::prelude::ToPrimitive;

        self.payable_total.amount().trunc().to_i64().unwrap_or(0)
    }

    /// Spins earned when this order is paid: one per full 1000 ₽ of the
    /// payable total, minimum one.
    #[must_use]
    pub fn spins_earned(&self) -> i64 {
        (self.whole_rubles() / 1000).max(1)
    }

    /// Loyalty points earned when this order is paid: one per 100 ₽.
    #[must_use]
    pub fn loyalty_earned(&self) -> i64 {
        self.whole_rubles() / 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_total(total: Money) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            status: OrderStatus::Pending,
            items: vec![],
            item_total: total,
            promo_discount: Money::ZERO,
            promo_code: None,
            delivery_provider: DeliveryProvider::Pickup,
            delivery_cost: Money::ZERO,
            certificate_code: None,
            certificate_applied: Money::ZERO,
            payable_total: total,
            recipient_name: "Test".to_owned(),
            recipient_phone: "+7 900 000-00-00".to_owned(),
            city: "Moscow".to_owned(),
            address: String::new(),
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    #[test]
    fn test_spins_earned_minimum_one() {
        let order = order_with_total(Money::from_rubles(300));
        assert_eq!(order.spins_earned(), 1);
    }

    #[test]
    fn test_spins_earned_per_thousand() {
        assert_eq!(order_with_total(Money::from_rubles(999)).spins_earned(), 1);
        assert_eq!(order_with_total(Money::from_rubles(1000)).spins_earned(), 1);
        assert_eq!(order_with_total(Money::from_rubles(2499)).spins_earned(), 2);
        assert_eq!(order_with_total(Money::from_rubles(5000)).spins_earned(), 5);
    }

    #[test]
    fn test_loyalty_earned() {
        assert_eq!(order_with_total(Money::from_rubles(99)).loyalty_earned(), 0);
        assert_eq!(
            order_with_total(Money::from_rubles(2499)).loyalty_earned(),
            24
        );
    }
}
