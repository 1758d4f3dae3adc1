//! Admin user management.

use sweet_delights_core::Email;
use sweet_delights_storefront::db::users::UserRepository;

use super::{CommandError, connect};

/// Grant or revoke admin rights for an existing user.
///
/// The user must have registered through the storefront first; this only
/// flips the flag. A change takes effect on the user's next login.
///
/// # Errors
///
/// Returns `CommandError` for bad emails, unknown users, or database
/// failures.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), CommandError> {
    let email =
        Email::parse(email).map_err(|e| CommandError::InvalidInput(format!("email: {e}")))?;

    let pool = connect().await?;
    UserRepository::new(&pool).set_admin(&email, is_admin).await?;

    if is_admin {
        tracing::info!(%email, "admin rights granted (effective on next login)");
    } else {
        tracing::info!(%email, "admin rights revoked (effective on next login)");
    }
    Ok(())
}
