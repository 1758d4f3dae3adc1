//! Status enums for orders, certificates, prizes, and delivery.
//!
//! Statuses are stored as TEXT; repositories convert with `as_str` /
//! `FromStr` so unknown database values surface as corruption errors
//! instead of panics.

use serde::{Deserialize, Serialize};

/// Error returned when a stored status string is not recognized.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown {kind} status: {value}")]
pub struct StatusParseError {
    /// Which enum failed to parse.
    pub kind: &'static str,
    /// The offending value.
    pub value: String,
}

/// Order lifecycle.
///
/// `pending` orders await Robokassa confirmation; everything downstream of
/// `paid` is fulfilment bookkeeping driven from the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether moving to `next` is a legal lifecycle step.
    ///
    /// Cancellation is allowed from any state short of `delivered`;
    /// everything else moves strictly forward.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Cancelled)
                | (Self::Paid, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered | Self::Cancelled)
        )
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StatusParseError {
                kind: "order",
                value: other.to_owned(),
            }),
        }
    }
}

/// Gift certificate lifecycle: `pending → active → used | expired`.
///
/// A certificate is created `pending` when purchased, becomes `active`
/// when its payment clears, `used` when the balance reaches zero, and
/// `expired` when the expiry date passes before the balance does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    #[default]
    Pending,
    Active,
    Used,
    Expired,
}

impl CertificateStatus {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }

    /// Whether moving to `next` is a legal lifecycle step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active | Self::Expired)
                | (Self::Active, Self::Used | Self::Expired)
        )
    }

    /// Whether the certificate can be redeemed against an order.
    #[must_use]
    pub const fn is_redeemable(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::str::FromStr for CertificateStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            other => Err(StatusParseError {
                kind: "certificate",
                value: other.to_owned(),
            }),
        }
    }
}

/// Prize kinds on the fortune wheel, ordered by unlock tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeKind {
    /// 5% off the next order.
    DiscountFive,
    /// A free lollipop added to the next order.
    FreeLollipop,
    /// 10% off the next order.
    DiscountTen,
    /// Free delivery on the next order.
    FreeShipping,
    /// A small gift box of assorted candy.
    GiftBox,
    /// The jackpot: a 1000 ₽ gift certificate.
    Jackpot,
}

impl PrizeKind {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DiscountFive => "discount_five",
            Self::FreeLollipop => "free_lollipop",
            Self::DiscountTen => "discount_ten",
            Self::FreeShipping => "free_shipping",
            Self::GiftBox => "gift_box",
            Self::Jackpot => "jackpot",
        }
    }

    /// Human-readable label used in API responses and Telegram messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DiscountFive => "5% off your next order",
            Self::FreeLollipop => "Free lollipop",
            Self::DiscountTen => "10% off your next order",
            Self::FreeShipping => "Free delivery",
            Self::GiftBox => "Small gift box",
            Self::Jackpot => "1000 ₽ gift certificate",
        }
    }

    /// Discount percent granted by the prize's promo code, if any.
    #[must_use]
    pub const fn discount_percent(self) -> Option<u8> {
        match self {
            Self::DiscountFive => Some(5),
            Self::DiscountTen => Some(10),
            Self::FreeLollipop | Self::FreeShipping | Self::GiftBox | Self::Jackpot => None,
        }
    }
}

impl std::str::FromStr for PrizeKind {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discount_five" => Ok(Self::DiscountFive),
            "free_lollipop" => Ok(Self::FreeLollipop),
            "discount_ten" => Ok(Self::DiscountTen),
            "free_shipping" => Ok(Self::FreeShipping),
            "gift_box" => Ok(Self::GiftBox),
            "jackpot" => Ok(Self::Jackpot),
            other => Err(StatusParseError {
                kind: "prize",
                value: other.to_owned(),
            }),
        }
    }
}

/// Delivery providers the storefront quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryProvider {
    Cdek,
    YandexDelivery,
    /// Customer pickup from the shop; no courier involved.
    Pickup,
}

impl DeliveryProvider {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cdek => "cdek",
            Self::YandexDelivery => "yandex_delivery",
            Self::Pickup => "pickup",
        }
    }
}

impl std::str::FromStr for DeliveryProvider {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cdek" => Ok(Self::Cdek),
            "yandex_delivery" => Ok(Self::YandexDelivery),
            "pickup" => Ok(Self::Pickup),
            other => Err(StatusParseError {
                kind: "delivery provider",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_order_status_no_backwards() {
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn test_order_cancellation_window() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn test_certificate_lifecycle() {
        assert!(CertificateStatus::Pending.can_transition_to(CertificateStatus::Active));
        assert!(CertificateStatus::Active.can_transition_to(CertificateStatus::Used));
        assert!(CertificateStatus::Active.can_transition_to(CertificateStatus::Expired));
        assert!(CertificateStatus::Pending.can_transition_to(CertificateStatus::Expired));
    }

    #[test]
    fn test_certificate_terminal_states() {
        assert!(!CertificateStatus::Used.can_transition_to(CertificateStatus::Active));
        assert!(!CertificateStatus::Expired.can_transition_to(CertificateStatus::Active));
        assert!(!CertificateStatus::Pending.can_transition_to(CertificateStatus::Used));
    }

    #[test]
    fn test_only_active_redeems() {
        assert!(CertificateStatus::Active.is_redeemable());
        assert!(!CertificateStatus::Pending.is_redeemable());
        assert!(!CertificateStatus::Used.is_redeemable());
        assert!(!CertificateStatus::Expired.is_redeemable());
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().ok(), Some(status));
        }
        assert!("teleported".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_prize_kind_discounts() {
        assert_eq!(PrizeKind::DiscountFive.discount_percent(), Some(5));
        assert_eq!(PrizeKind::DiscountTen.discount_percent(), Some(10));
        assert_eq!(PrizeKind::Jackpot.discount_percent(), None);
        assert_eq!(PrizeKind::FreeShipping.discount_percent(), None);
    }
}
