//! Role checks for admin-only and admin-or-self operations.
//!
//! Both checks run before any target lookup so that a denied caller learns
//! nothing about which ids exist.

use crate::auth::user::{User, UserId};
use crate::errors::{ContactbookError, Result};

pub const ADMIN_REQUIRED: &str = "Admin access required";
pub const ADMIN_OR_SELF_REQUIRED: &str = "Access denied: admin or self access required";

/// Allow only admins
pub fn require_admin(caller: &User) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ContactbookError::forbidden(ADMIN_REQUIRED))
    }
}

/// Allow admins, or the caller acting on their own account
pub fn require_admin_or_self(caller: &User, target: UserId) -> Result<()> {
    if caller.is_admin() || caller.id == target {
        Ok(())
    } else {
        Err(ContactbookError::forbidden(ADMIN_OR_SELF_REQUIRED))
    }
}
