//! Money type backed by decimal arithmetic.
//!
//! The shop sells in rubles; amounts are stored as `NUMERIC(12, 2)` and
//! carried as [`rust_decimal::Decimal`] to avoid float rounding in totals.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors from money arithmetic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// Result would be negative.
    #[error("amount cannot go negative")]
    Negative,
    /// Arithmetic overflowed the decimal range.
    #[error("amount overflow")]
    Overflow,
}

/// ISO 4217 currency codes the shop can price in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    /// Russian ruble - the only currency the storefront currently charges in.
    #[default]
    RUB,
}

impl Currency {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::RUB => "₽",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::RUB => "RUB",
        }
    }
}

/// A non-negative monetary amount.
///
/// Construction clamps nothing and checks nothing beyond sign; arithmetic
/// is explicit (`checked_add` / `checked_sub`) so call sites decide how to
/// surface overflow and underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero rubles.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative input.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create from whole rubles.
    #[must_use]
    pub fn from_rubles(rubles: u32) -> Self {
        Self(Decimal::from(rubles))
    }

    /// Create from kopecks (1/100 ruble).
    #[must_use]
    pub fn from_kopecks(kopecks: u64) -> Self {
        Self(Decimal::new(
            i64::try_from(kopecks).unwrap_or(i64::MAX),
            2,
        ))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the sum leaves the decimal range.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction; underflow is an error, not a negative amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `other > self`.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        if other.0 > self.0 {
            return Err(MoneyError::Negative);
        }
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MoneyError::Negative)
    }

    /// Subtraction clamped to zero. Used when applying a certificate whose
    /// balance may exceed the remaining total.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Multiply by a quantity (line subtotals).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product leaves the decimal range.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// A percentage of the amount, rounded to kopecks. Used for promo
    /// discounts, so the result is always within `[0, self]` for
    /// `percent <= 100`.
    #[must_use]
    pub fn percent(self, percent: u8) -> Self {
        let factor = Decimal::from(percent)
            .checked_div(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO);
        Self((self.0 * factor).round_dp(2))
    }

    /// Format for Robokassa: plain decimal with two fraction digits and no
    /// currency symbol (e.g. `1499.00`).
    #[must_use]
    pub fn to_payment_string(self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.0, Currency::RUB.symbol())
    }
}

// SQLx support (with postgres feature): Money maps to NUMERIC.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Money::new(Decimal::new(-1, 2)), Err(MoneyError::Negative));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_from_kopecks() {
        let price = Money::from_kopecks(149_900);
        assert_eq!(price.to_payment_string(), "1499.00");
    }

    #[test]
    fn test_checked_sub_underflow() {
        let a = Money::from_rubles(100);
        let b = Money::from_rubles(150);
        assert_eq!(a.checked_sub(b), Err(MoneyError::Negative));
        assert_eq!(b.checked_sub(a).unwrap(), Money::from_rubles(50));
    }

    #[test]
    fn test_saturating_sub_clamps_to_zero() {
        let total = Money::from_rubles(300);
        let certificate = Money::from_rubles(1000);
        assert_eq!(total.saturating_sub(certificate), Money::ZERO);
        assert_eq!(
            Money::from_rubles(1000).saturating_sub(Money::from_rubles(300)),
            Money::from_rubles(700)
        );
    }

    #[test]
    fn test_checked_mul_line_subtotal() {
        let unit = Money::from_kopecks(25_050);
        let line = unit.checked_mul(3).unwrap();
        assert_eq!(line.to_payment_string(), "751.50");
    }

    #[test]
    fn test_min() {
        let a = Money::from_rubles(100);
        let b = Money::from_rubles(200);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }

    #[test]
    fn test_percent_rounds_to_kopecks() {
        let total = Money::from_kopecks(99_999); // 999.99
        assert_eq!(total.percent(10).to_payment_string(), "100.00");
        assert_eq!(total.percent(0), Money::ZERO);
        assert_eq!(total.percent(100), total);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rubles(1499).to_string(), "1499.00 ₽");
    }

    #[test]
    fn test_serde_uses_decimal_string() {
        // serde-with-str on rust_decimal keeps amounts exact over JSON
        let price = Money::from_kopecks(9_990);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"99.90\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
