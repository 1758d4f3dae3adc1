//! Cart domain types.

use serde::Serialize;

use sweet_delights_core::{CartId, CartItemId, Money, MoneyError, ProductId, UserId};

/// A line in a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// Line ID.
    pub id: CartItemId,
    /// Product being bought.
    pub product_id: ProductId,
    /// Product handle (denormalized for API responses).
    pub handle: String,
    /// Product title (denormalized for API responses).
    pub title: String,
    /// Unit price at the time the line is read (live catalog price;
    /// snapshots happen at checkout, not here).
    pub unit_price: Money,
    /// Quantity, always >= 1.
    pub quantity: i32,
    /// Shipping weight of one unit, in grams.
    pub weight_grams: i32,
}

impl CartItem {
    /// Line subtotal (`unit_price * quantity`).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on absurd quantities.
    pub fn subtotal(&self) -> Result<Money, MoneyError> {
        self.unit_price
            .checked_mul(u32::try_from(self.quantity).unwrap_or(0))
    }
}

/// A user's open cart.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Owning user.
    pub user_id: UserId,
    /// Lines, ordered by insertion.
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of line subtotals.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the total leaves the decimal range.
    pub fn total(&self) -> Result<Money, MoneyError> {
        let mut total = Money::ZERO;
        for item in &self.items {
            total = total.checked_add(item.subtotal()?)?;
        }
        Ok(total)
    }

    /// Total shipping weight in grams.
    #[must_use]
    pub fn total_weight_grams(&self) -> i64 {
        self.items
            .iter()
            .map(|item| i64::from(item.weight_grams) * i64::from(item.quantity))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, price_kopecks: u64, quantity: i32, weight: i32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            handle: format!("candy-{id}"),
            title: format!("Candy {id}"),
            unit_price: Money::from_kopecks(price_kopecks),
            quantity,
            weight_grams: weight,
        }
    }

    #[test]
    fn test_line_subtotal() {
        let line = item(1, 25_050, 3, 100);
        assert_eq!(line.subtotal().unwrap().to_payment_string(), "751.50");
    }

    #[test]
    fn test_cart_total_and_weight() {
        let cart = Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            items: vec![item(1, 10_000, 2, 150), item(2, 49_900, 1, 800)],
        };
        assert_eq!(cart.total().unwrap().to_payment_string(), "699.00");
        assert_eq!(cart.total_weight_grams(), 1100);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            items: vec![],
        };
        assert!(cart.is_empty());
        assert_eq!(cart.total().unwrap(), Money::ZERO);
        assert_eq!(cart.total_weight_grams(), 0);
    }
}
