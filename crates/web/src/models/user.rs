//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use catalog_core::{Email, Role, UserId};

/// A catalog user (domain type).
///
/// The password hash is deliberately absent; it only leaves the repository
/// for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address.
    pub email: Email,
    /// Access tier.
    pub role: Role,
}
