//! Offset pagination defaults and helpers.
//!
//! Offset paging makes no stability promise across calls: rows inserted or
//! deleted between two pages shift the window.

use serde::Deserialize;

use crate::error::CoreError;

/// Default number of products per page.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Maximum number of products per page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Caller-supplied pagination parameters (`?limit=&offset=`).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    /// Resolve defaults into a concrete window.
    ///
    /// A supplied limit below 1 or a negative offset is rejected; a limit
    /// above [`MAX_PAGE_LIMIT`] is clamped down to it.
    pub fn resolve(self) -> Result<PageRequest, CoreError> {
        if let Some(limit) = self.limit.filter(|l| *l < 1) {
            return Err(CoreError::Validation(format!(
                "limit must be a positive integer, got {limit}"
            )));
        }
        if let Some(offset) = self.offset.filter(|o| *o < 0) {
            return Err(CoreError::Validation(format!(
                "offset must be zero or greater, got {offset}"
            )));
        }
        Ok(PageRequest {
            limit: clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// A resolved pagination window. `1 <= limit <= MAX_PAGE_LIMIT`, `offset >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

/// Cap a user-provided limit at `max`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).min(max)
}
