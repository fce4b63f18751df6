//! Shared key-value store with per-entry expiry.
//!
//! Both the rate limiter (`rate_limit:<ip>` counters) and the response cache
//! (`api_cache:<digest>` entries) keep their state here. The store is the only
//! shared mutable resource of the middleware pipeline.
//!
//! # Semantics
//!
//! - An entry whose expiry has passed is treated as absent by every read.
//! - [`CacheStore::put`] overwrites unconditionally (last write wins).
//! - [`CacheStore::increment_within`] is atomic with respect to other calls on
//!   the same store, so concurrent requests from one client cannot both pass
//!   the limit check with the same count.

mod clock;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryStore;

/// A fully buffered HTTP response kept by the response cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Value held under a store key.
#[derive(Debug, Clone)]
pub enum CacheValue {
    /// Request counter for the rate limiter.
    Counter(u64),
    /// Memoized GET response.
    Response(Arc<CachedResponse>),
}

/// Counter state reported by [`CacheStore::increment_within`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterHit {
    /// Count stored under the key after the call.
    pub count: u64,
    /// When the counter expires and resets to zero.
    pub expires_at: DateTime<Utc>,
}

/// TTL-capable key-value store.
pub trait CacheStore: Send + Sync {
    /// Read a live entry.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Store `value` under `key`, expiring `ttl` from now.
    fn put(&self, key: &str, value: CacheValue, ttl: Duration);

    /// Increment the counter under `key` unless it already reached `max`.
    ///
    /// On success the counter is stored with a fresh expiry of `ttl` from now
    /// (a rolling window) and `Ok` carries the new count. When the counter is
    /// already at or above `max` the entry is left untouched and `Err` carries
    /// the current count and expiry.
    fn increment_within(&self, key: &str, max: u64, ttl: Duration) -> Result<CounterHit, CounterHit>;

    /// Remove an entry. Returns whether a live entry was removed.
    fn forget(&self, key: &str) -> bool;

    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;

    /// Number of entries currently held, including expired ones not yet purged.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle used by the middleware layers and the application state.
pub type SharedStore = Arc<dyn CacheStore>;
