use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Success envelope shared by every catalogue endpoint.
///
/// ```json
/// {
///   "success": true,
///   "message": "Productos obtenidos exitosamente",
///   "data": { ... },
///   "response_time": 0.002
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Handler time in seconds, rounded to milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            response_time: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Stamp the time elapsed since `started`.
    pub fn timed(mut self, started: Instant) -> Self {
        let seconds = started.elapsed().as_secs_f64();
        self.response_time = Some((seconds * 1000.0).round() / 1000.0);
        self
    }
}

impl ApiResponse<()> {
    /// Envelope carrying only a message (e.g. after a delete).
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            response_time: None,
        }
    }
}

/// Page metadata for list endpoints.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
    /// 1-based position of the first item on the page, `null` when empty.
    pub from: Option<u64>,
    pub to: Option<u64>,
}

/// Slice `items` into the requested page.
///
/// Pages start at 1; `page` 0 is treated as 1. A page past the end yields no
/// items but keeps the requested `current_page`. `last_page` is at least 1.
#[allow(clippy::cast_possible_truncation)]
pub fn paginate<T>(items: Vec<T>, page: u64, per_page: u64) -> (Vec<T>, Pagination) {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = items.len() as u64;
    let last_page = total.div_ceil(per_page).max(1);
    let offset = (page - 1).saturating_mul(per_page);

    let page_items: Vec<T> = items
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    let count = page_items.len() as u64;
    let (from, to) = if count == 0 {
        (None, None)
    } else {
        (Some(offset + 1), Some(offset + count))
    };

    (
        page_items,
        Pagination {
            current_page: page,
            last_page,
            per_page,
            total,
            from,
            to,
        },
    )
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Service statistics.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub categories: usize,
    pub products: usize,
    pub workshops: usize,
    pub faqs: usize,
    pub about_us: usize,
    /// Entries in the shared cache store, including rate-limit counters.
    pub cache_entries: usize,
    pub uptime_seconds: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_first_page() {
        let (items, page) = paginate((1..=35).collect::<Vec<_>>(), 1, 15);

        assert_eq!(items.len(), 15);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 35);
        assert_eq!(page.from, Some(1));
        assert_eq!(page.to, Some(15));
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let (items, page) = paginate((1..=35).collect::<Vec<_>>(), 3, 15);

        assert_eq!(items, vec![31, 32, 33, 34, 35]);
        assert_eq!(page.from, Some(31));
        assert_eq!(page.to, Some(35));
    }

    #[test]
    fn test_paginate_out_of_range_and_empty() {
        let (items, page) = paginate(vec![1, 2, 3], 9, 15);
        assert!(items.is_empty());
        assert_eq!(page.current_page, 9);
        assert_eq!(page.from, None);

        let (_, page) = paginate(Vec::<u8>::new(), 0, 15);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_envelope_skips_absent_fields() {
        let json = serde_json::to_value(ApiResponse::message_only("Producto eliminado exitosamente")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "message": "Producto eliminado exitosamente" })
        );
    }

    #[test]
    fn test_response_time_is_rounded() {
        let response = ApiResponse::data(1).timed(Instant::now());
        let time = response.response_time.unwrap();
        assert!((time * 1000.0).fract().abs() < 1e-9);
    }
}
