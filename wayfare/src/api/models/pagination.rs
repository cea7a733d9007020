//! Shared pagination types for API query parameters.
//!
//! Every list endpoint pages with `skip` and `limit` query parameters.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Offset pagination for list endpoints:
/// - `skip`: Number of items to skip (default: 0)
/// - `limit`: Maximum items to return (default: 20, max: 100)
///
/// The `limit` is clamped to ensure it's always between 1 and 100,
/// preventing both zero-result queries and excessive data fetching.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the skip value, defaulting to 0 if not specified.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// A page of results plus the total count before paging.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The items for the current page
    pub data: Vec<T>,
    /// Total number of items matching the query (before pagination)
    pub total_count: i64,
    /// Number of items skipped
    pub skip: i64,
    /// Maximum items returned per page
    pub limit: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self {
            data,
            total_count,
            skip,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(skip: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination { skip, limit }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Pagination::default().params(), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        assert_eq!(page(Some(-3), Some(0)).params(), (0, 1));
        assert_eq!(page(None, Some(-5)).limit(), 1);
        assert_eq!(page(None, Some(5000)).limit(), MAX_LIMIT);
        assert_eq!(page(Some(40), Some(25)).params(), (40, 25));
    }

    #[test]
    fn test_query_strings_parse() {
        // Flattened into other query structs, numbers arrive as strings
        let parsed: Pagination = serde_json::from_value(serde_json::json!({"skip": "10", "limit": "5"})).unwrap();
        assert_eq!(parsed.params(), (10, 5));
    }
}
