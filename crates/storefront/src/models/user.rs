//! User domain types.

use chrono::{DateTime, Utc};

use sweet_delights_core::{Email, UserId};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Unspent wheel spins, earned through paid orders.
    pub spins: i64,
    /// Lifetime spins earned; never decremented. Drives prize tier unlocks.
    pub lifetime_spins: i64,
    /// Loyalty point balance.
    pub loyalty_points: i64,
    /// Whether the user can reach the admin endpoints.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
