//! Pagination utilities for list endpoints

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: Option<u32>,

    /// Items per page
    pub limit: Option<u32>,
}

impl PageRequest {
    /// Maximum allowed items per page
    pub const MAX_LIMIT: u32 = 100;

    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Returns the clamped limit
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Returns the page (1-indexed, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Calculate SQL OFFSET
    pub fn offset(&self) -> u64 {
        (self.page() as u64 - 1) * self.limit() as u64
    }

    /// Whether rows remain past the current window
    pub fn has_more(&self, total: u64) -> bool {
        total > self.offset() + self.limit() as u64
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            data,
            total,
            page: request.page(),
            limit: request.limit(),
            has_more: request.has_more(total),
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_page_of_forty_five() {
        let req = PageRequest::new(3, 20);
        assert_eq!(req.offset(), 40);
        assert!(!req.has_more(45));
        assert!(PageRequest::new(2, 20).has_more(45));
    }

    #[test]
    fn clamps_inputs() {
        let req = PageRequest { page: Some(0), limit: Some(500) };
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), PageRequest::MAX_LIMIT);
        assert_eq!(PageRequest { page: None, limit: Some(0) }.limit(), 1);
        assert_eq!(PageRequest::default().limit(), 20);
    }
}
