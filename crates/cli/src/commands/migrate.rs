//! Database migration command.
//!
//! Runs the migrations embedded in the storefront crate
//! (`crates/storefront/migrations/`).

use super::{CommandError, connect};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sweet_delights_storefront::db::migrator().run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
