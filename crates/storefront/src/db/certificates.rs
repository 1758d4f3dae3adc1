//! Gift certificate repository.
//!
//! Balance and lifecycle invariants are enforced with conditional UPDATEs
//! so concurrent redemptions cannot overdraw a certificate.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sweet_delights_core::{
    CertificateCode, CertificateId, CertificateStatus, Money, OrderId, UserId,
};

use super::RepositoryError;
use crate::models::certificate::GiftCertificate;

/// Database row for a gift certificate.
#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: CertificateId,
    code: String,
    initial_value: Money,
    balance: Money,
    status: String,
    purchaser_id: Option<UserId>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
}

impl TryFrom<CertificateRow> for GiftCertificate {
    type Error = RepositoryError;

    fn try_from(row: CertificateRow) -> Result<Self, Self::Error> {
        let code = CertificateCode::parse(&row.code)
            .map_err(|e| RepositoryError::DataCorruption(format!("bad certificate code: {e}")))?;
        let status: CertificateStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;

        Ok(Self {
            id: row.id,
            code,
            initial_value: row.initial_value,
            balance: row.balance,
            status,
            purchaser_id: row.purchaser_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            activated_at: row.activated_at,
        })
    }
}

const CERTIFICATE_COLUMNS: &str = "id, code, initial_value, balance, status, purchaser_id, \
     expires_at, created_at, activated_at";

/// Repository for gift certificate database operations.
pub struct CertificateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CertificateRepository<'a> {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a certificate.
    ///
    /// Purchased certificates start `pending` (awaiting payment) and carry
    /// the purchaser; jackpot prizes start `active` with no purchaser.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a code collision.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        code: &CertificateCode,
        value: Money,
        status: CertificateStatus,
        purchaser_id: Option<UserId>,
        order_id: Option<OrderId>,
        expires_at: DateTime<Utc>,
    ) -> Result<GiftCertificate, RepositoryError> {
        let activated_at = matches!(status, CertificateStatus::Active).then(Utc::now);

        let row: CertificateRow = sqlx::query_as(&format!(
            "INSERT INTO gift_certificates \
                 (code, initial_value, balance, status, purchaser_id, order_id, expires_at, activated_at) \
             VALUES ($1, $2, $2, $3, $4, $5, $6, $7) \
             RETURNING {CERTIFICATE_COLUMNS}"
        ))
        .bind(code.as_str())
        .bind(value)
        .bind(status.as_str())
        .bind(purchaser_id)
        .bind(order_id)
        .bind(expires_at)
        .bind(activated_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("certificate code collision".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        GiftCertificate::try_from(row)
    }

    /// Look up a certificate by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(
        &self,
        code: &CertificateCode,
    ) -> Result<Option<GiftCertificate>, RepositoryError> {
        let row: Option<CertificateRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM gift_certificates WHERE code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(GiftCertificate::try_from).transpose()
    }

    /// Activate the pending certificates attached to a paid order.
    ///
    /// Returns the number of certificates activated (zero is normal for
    /// orders without certificates in them).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn activate_for_order(&self, order_id: OrderId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE gift_certificates \
             SET status = $2, activated_at = NOW() \
             WHERE order_id = $1 AND status = $3",
        )
        .bind(order_id)
        .bind(CertificateStatus::Active.as_str())
        .bind(CertificateStatus::Pending.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Redeem up to `amount` from an active, unexpired certificate.
    ///
    /// The conditional UPDATE decrements `LEAST(balance, $amount)` in one
    /// statement, so concurrent redemptions can never push the balance
    /// negative. A certificate drained to zero flips to `used`.
    ///
    /// Returns the amount actually redeemed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the certificate is not
    /// redeemable (wrong status, zero balance, or expired).
    pub async fn redeem_up_to(
        &self,
        code: &CertificateCode,
        amount: Money,
    ) -> Result<Money, RepositoryError> {
        // The CTE locks the row and captures the pre-update balance so the
        // redeemed amount can be computed in the same statement.
        let row: Option<(Money,)> = sqlx::query_as(
            "WITH target AS ( \
                 SELECT id, balance FROM gift_certificates \
                 WHERE code = $1 AND status = $4 AND balance > 0 AND expires_at > NOW() \
                 FOR UPDATE \
             ) \
             UPDATE gift_certificates g \
             SET balance = g.balance - LEAST(g.balance, $2), \
                 status = CASE WHEN g.balance - LEAST(g.balance, $2) = 0 THEN $3 ELSE g.status END \
             FROM target \
             WHERE g.id = target.id \
             RETURNING LEAST(target.balance, $2)",
        )
        .bind(code.as_str())
        .bind(amount)
        .bind(CertificateStatus::Used.as_str())
        .bind(CertificateStatus::Active.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some((redeemed,)) => Ok(redeemed),
            None => Err(RepositoryError::Conflict(
                "certificate is not redeemable".to_owned(),
            )),
        }
    }

    /// List certificates, newest first. Admin view; codes are masked at
    /// the route layer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<GiftCertificate>, RepositoryError> {
        let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM gift_certificates ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(GiftCertificate::try_from).collect()
    }

    /// Mark every past-expiry pending/active certificate `expired`.
    ///
    /// Returns the number of certificates swept. Run from the CLI.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn expire_overdue(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE gift_certificates \
             SET status = $1 \
             WHERE status IN ($2, $3) AND expires_at <= NOW()",
        )
        .bind(CertificateStatus::Expired.as_str())
        .bind(CertificateStatus::Pending.as_str())
        .bind(CertificateStatus::Active.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
