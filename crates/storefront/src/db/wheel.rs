//! Fortune wheel repository.
//!
//! The spin itself is one transaction: consume a spin, materialize the
//! prize, append to the history log. The spin decrement is conditional on
//! `spins >= 1`, so two concurrent requests cannot spend the same spin.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sweet_delights_core::{
    CertificateCode, CertificateId, CertificateStatus, Money, PrizeId, PrizeKind, PromoCode,
    SpinId, UserId,
};

use super::RepositoryError;
use crate::models::wheel::{SpinRecord, WheelPrize};

/// Database row for a wheel prize.
#[derive(sqlx::FromRow)]
struct PrizeRow {
    id: PrizeId,
    user_id: UserId,
    kind: String,
    promo_code: Option<String>,
    certificate_id: Option<CertificateId>,
    expires_at: DateTime<Utc>,
    used: bool,
    won_at: DateTime<Utc>,
}

impl TryFrom<PrizeRow> for WheelPrize {
    type Error = RepositoryError;

    fn try_from(row: PrizeRow) -> Result<Self, Self::Error> {
        let kind: PrizeKind = row
            .kind
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
        let promo_code = row
            .promo_code
            .as_deref()
            .map(PromoCode::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("bad promo code: {e}")))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            kind,
            promo_code,
            certificate_id: row.certificate_id,
            expires_at: row.expires_at,
            used: row.used,
            won_at: row.won_at,
        })
    }
}

/// Database row for a spin log entry.
#[derive(sqlx::FromRow)]
struct SpinRow {
    id: SpinId,
    user_id: UserId,
    kind: String,
    spins_total: i64,
    spun_at: DateTime<Utc>,
}

impl TryFrom<SpinRow> for SpinRecord {
    type Error = RepositoryError;

    fn try_from(row: SpinRow) -> Result<Self, Self::Error> {
        let kind: PrizeKind = row
            .kind
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            kind,
            spins_total: row.spins_total,
            spun_at: row.spun_at,
        })
    }
}

const PRIZE_COLUMNS: &str =
    "id, user_id, kind, promo_code, certificate_id, expires_at, used, won_at";

/// A prize drawn by the wheel engine, ready to be materialized.
#[derive(Debug, Clone)]
pub struct DrawnPrize {
    /// What was drawn.
    pub kind: PrizeKind,
    /// Promo code for discount-style prizes.
    pub promo_code: Option<PromoCode>,
    /// Jackpots mint a gift certificate with this code and value.
    pub certificate: Option<(CertificateCode, Money)>,
    /// When the prize (and any minted certificate) expires.
    pub expires_at: DateTime<Utc>,
}

/// Repository for wheel database operations.
pub struct WheelRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WheelRepository<'a> {
    /// Create a new wheel repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Consume one spin and materialize the drawn prize.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user has no spins left.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn execute_spin(
        &self,
        user_id: UserId,
        drawn: &DrawnPrize,
    ) -> Result<WheelPrize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Spend the spin; the condition makes double-spends lose the race.
        let lifetime: Option<(i64,)> = sqlx::query_as(
            "UPDATE users SET spins = spins - 1, updated_at = NOW() \
             WHERE id = $1 AND spins >= 1 \
             RETURNING lifetime_spins",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((lifetime_spins,)) = lifetime else {
            return Err(RepositoryError::Conflict("no spins available".to_owned()));
        };

        // Jackpots mint an already-active certificate owned by nobody;
        // redemption is by code, exactly like a purchased one.
        let certificate_id: Option<CertificateId> = match &drawn.certificate {
            Some((code, value)) => {
                let row: (CertificateId,) = sqlx::query_as(
                    "INSERT INTO gift_certificates \
                         (code, initial_value, balance, status, expires_at, activated_at) \
                     VALUES ($1, $2, $2, $3, $4, NOW()) \
                     RETURNING id",
                )
                .bind(code.as_str())
                .bind(*value)
                .bind(CertificateStatus::Active.as_str())
                .bind(drawn.expires_at)
                .fetch_one(&mut *tx)
                .await?;
                Some(row.0)
            }
            None => None,
        };

        let prize_row: PrizeRow = sqlx::query_as(&format!(
            "INSERT INTO wheel_prizes (user_id, kind, promo_code, certificate_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PRIZE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(drawn.kind.as_str())
        .bind(drawn.promo_code.as_ref().map(PromoCode::as_str))
        .bind(certificate_id)
        .bind(drawn.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO wheel_spins (user_id, kind, spins_total) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(drawn.kind.as_str())
        .bind(lifetime_spins)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        WheelPrize::try_from(prize_row)
    }

    /// The user's spin history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<SpinRecord>, RepositoryError> {
        let rows: Vec<SpinRow> = sqlx::query_as(
            "SELECT id, user_id, kind, spins_total, spun_at \
             FROM wheel_spins WHERE user_id = $1 \
             ORDER BY spun_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SpinRecord::try_from).collect()
    }

    /// The user's unused, unexpired prizes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn applicable_prizes(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WheelPrize>, RepositoryError> {
        let rows: Vec<PrizeRow> = sqlx::query_as(&format!(
            "SELECT {PRIZE_COLUMNS} FROM wheel_prizes \
             WHERE user_id = $1 AND NOT used AND expires_at > NOW() \
             ORDER BY won_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(WheelPrize::try_from).collect()
    }

    /// Find the user's unused, unexpired prize carrying this promo code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_applicable_by_code(
        &self,
        user_id: UserId,
        promo_code: &PromoCode,
    ) -> Result<Option<WheelPrize>, RepositoryError> {
        let row: Option<PrizeRow> = sqlx::query_as(&format!(
            "SELECT {PRIZE_COLUMNS} FROM wheel_prizes \
             WHERE user_id = $1 AND promo_code = $2 AND NOT used AND expires_at > NOW()"
        ))
        .bind(user_id)
        .bind(promo_code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(WheelPrize::try_from).transpose()
    }

    /// Mark a prize used. Conditional so a prize is only spent once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the prize was already used.
    pub async fn mark_prize_used(&self, prize_id: PrizeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE wheel_prizes SET used = TRUE WHERE id = $1 AND NOT used")
            .bind(prize_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict("prize already used".to_owned()));
        }

        Ok(())
    }
}
