//! Gift certificate domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sweet_delights_core::{CertificateCode, CertificateId, CertificateStatus, Money, UserId};

/// A prepaid balance code redeemable against order totals.
///
/// Invariants (backed by CHECK constraints and conditional updates):
/// `0 <= balance <= initial_value`, and redemption only happens while the
/// status is `active`.
#[derive(Debug, Clone, Serialize)]
pub struct GiftCertificate {
    /// Certificate ID.
    pub id: CertificateId,
    /// Redemption code, e.g. `SD-MK4T-9QWE-R2YB`.
    pub code: CertificateCode,
    /// Face value at purchase.
    pub initial_value: Money,
    /// Remaining balance.
    pub balance: Money,
    /// Lifecycle status.
    pub status: CertificateStatus,
    /// Who bought it (None for jackpot prizes issued by the wheel).
    pub purchaser_id: Option<UserId>,
    /// Expiry; redemption past this point is refused and the sweep marks
    /// the certificate expired.
    pub expires_at: DateTime<Utc>,
    /// When it was purchased or won.
    pub created_at: DateTime<Utc>,
    /// When the payment cleared (or immediately, for prizes).
    pub activated_at: Option<DateTime<Utc>>,
}

impl GiftCertificate {
    /// Whether the certificate can cover part of an order right now.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status.is_redeemable() && !self.balance.is_zero() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn certificate(status: CertificateStatus, balance: Money) -> GiftCertificate {
        let mut rng = StdRng::seed_from_u64(3);
        GiftCertificate {
            id: CertificateId::new(1),
            code: CertificateCode::generate(&mut rng),
            initial_value: Money::from_rubles(1000),
            balance,
            status,
            purchaser_id: Some(UserId::new(1)),
            expires_at: Utc::now() + Duration::days(180),
            created_at: Utc::now(),
            activated_at: None,
        }
    }

    #[test]
    fn test_active_with_balance_is_redeemable() {
        let cert = certificate(CertificateStatus::Active, Money::from_rubles(500));
        assert!(cert.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_pending_is_not_redeemable() {
        let cert = certificate(CertificateStatus::Pending, Money::from_rubles(1000));
        assert!(!cert.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_zero_balance_is_not_redeemable() {
        let cert = certificate(CertificateStatus::Active, Money::ZERO);
        assert!(!cert.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_past_expiry_is_not_redeemable() {
        let cert = certificate(CertificateStatus::Active, Money::from_rubles(500));
        let later = cert.expires_at + Duration::days(1);
        assert!(!cert.is_redeemable(later));
    }
}
