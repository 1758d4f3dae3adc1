//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` / `user_passwords` - Accounts, argon2 hashes, spin and
//!   loyalty balances
//! - `sessions` - Tower-sessions storage (created by the session store)
//! - `products` - Candy catalog
//! - `carts` / `cart_items` - One open cart per user
//! - `orders` / `order_items` - Checkout snapshots
//! - `gift_certificates` - Prepaid balance codes
//! - `wheel_prizes` / `wheel_spins` - Fortune wheel prizes and history
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p sd-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod certificates;
pub mod orders;
pub mod products;
pub mod users;
pub mod wheel;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value failed domain validation on the way out.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A uniqueness or state precondition failed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row does not exist.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Embedded migrations for the storefront database.
///
/// Exposed so the CLI can run them without duplicating the path.
#[must_use]
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}
