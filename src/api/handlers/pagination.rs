//! Shared pagination types for list endpoints.
//!
//! Provides `PaginationQuery` for request parameters and
//! `PaginatedResponse<T>` for the list response format.

use serde::{Deserialize, Serialize};

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default limit for paginated list queries.
pub fn default_limit() -> i64 {
    50
}

/// Shared pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50)
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip (default: 0)
    #[serde(default)]
    pub offset: i64,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { limit: default_limit(), offset: 0 }
    }
}

impl PaginationQuery {
    /// Clamp pagination parameters to safe bounds.
    ///
    /// Limits the `limit` to the range [1, max_limit] and ensures `offset` >= 0.
    pub fn clamp(&self, max_limit: i64) -> (i64, i64) {
        (self.limit.clamp(1, max_limit), self.offset.max(0))
    }
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginatedResponse<T> {
    /// The list of items for the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Applied limit
    pub limit: i64,
    /// Applied offset
    pub offset: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self { items, total, limit, offset }
    }
}
