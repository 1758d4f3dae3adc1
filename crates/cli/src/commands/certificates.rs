//! Gift certificate housekeeping.

use sweet_delights_storefront::db::certificates::CertificateRepository;

use super::{CommandError, connect};

/// Sweep past-expiry certificates into the `expired` status.
///
/// Meant to run daily from cron; redemption checks expiry on their own,
/// so a late sweep is a bookkeeping matter, not a correctness one.
///
/// # Errors
///
/// Returns `CommandError` if the connection or the sweep fails.
pub async fn expire() -> Result<(), CommandError> {
    let pool = connect().await?;

    let swept = CertificateRepository::new(&pool).expire_overdue().await?;
    tracing::info!(swept, "expired overdue gift certificates");

    Ok(())
}
