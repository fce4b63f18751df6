//! HTTP middleware for rate limiting, authentication and response caching.
//!
//! - **Rate Limiting**: per-IP rolling-window counters in the shared store
//! - **Bearer Authentication**: allow-list or shared-secret token checks
//! - **Response Cache**: memoized `200 OK` GET responses keyed by full URL
//! - **Client IP**: peer address with trusted-proxy header support
//!
//! # Architecture
//!
//! ```text
//! Request → Rate Limiter → Bearer Auth → Response Cache → Handler
//!              ↓            (writes)        (GET)
//!          429 Too Many   401 Unauth     X-Cache: HIT
//! ```
//!
//! Rate limiter and response cache keep their state in the same
//! [`CacheStore`](crate::store::CacheStore).

pub mod auth;
pub mod cache;
pub mod ip;
pub mod rate_limit;

pub use auth::{BearerAuthLayer, BearerPolicy};
pub use cache::{ResponseCacheLayer, cache_key, full_url};
pub use ip::{CidrRange, TrustedProxyConfig, UNKNOWN_IP, extract_client_ip};
pub use rate_limit::{RateLimitError, RateLimitLayer};
