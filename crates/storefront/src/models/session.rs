//! Session payload types and keys.

use serde::{Deserialize, Serialize};

use sweet_delights_core::{Email, UserId};

/// Keys under which values are stored in the tower-sessions session.
pub mod session_keys {
    /// The logged-in user ([`super::CurrentUser`]).
    pub const CURRENT_USER: &str = "current_user";
}

/// The logged-in user, as stored in the session cookie's server-side record.
///
/// `is_admin` is a snapshot from login time; revoking admin rights takes
/// effect on next login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID.
    pub id: UserId,
    /// Email address at login time.
    pub email: Email,
    /// Admin flag at login time.
    pub is_admin: bool,
}
