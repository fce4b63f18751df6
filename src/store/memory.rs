//! In-process [`CacheStore`] implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::trace;

use super::{CacheStore, CacheValue, Clock, CounterHit, SystemClock};

#[derive(Debug, Clone)]
struct Entry {
    value: CacheValue,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Hash map guarded by a read-write lock, with expiry driven by a [`Clock`].
///
/// Expired entries stay in the map until [`CacheStore::purge_expired`] runs,
/// but are never returned by reads.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CacheValue> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: CacheValue, ttl: Duration) {
        let expires_at = Self::expiry_from(self.clock.now(), ttl);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), Entry { value, expires_at });
    }

    fn increment_within(&self, key: &str, max: u64, ttl: Duration) -> Result<CounterHit, CounterHit> {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let current = match entries.get(key) {
            Some(entry) if entry.is_live(now) => match entry.value {
                CacheValue::Counter(count) => Some((count, entry.expires_at)),
                // A non-counter value under a counter key is overwritten.
                CacheValue::Response(_) => None,
            },
            _ => None,
        };

        if let Some((count, expires_at)) = current
            && count >= max
        {
            return Err(CounterHit { count, expires_at });
        }

        let count = current.map_or(0, |(count, _)| count) + 1;
        let expires_at = Self::expiry_from(now, ttl);
        entries.insert(
            key.to_string(),
            Entry {
                value: CacheValue::Counter(count),
                expires_at,
            },
        );

        Ok(CounterHit { count, expires_at })
    }

    fn forget(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).is_some_and(|entry| entry.is_live(now))
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            trace!(removed, remaining = entries.len(), "Purged expired cache entries");
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};

    use super::*;
    use crate::store::{CachedResponse, ManualClock};

    const MINUTE: Duration = Duration::from_secs(60);

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_750_000_000, 0).unwrap(),
        ));
        let store = MemoryStore::with_clock(clock.clone());
        (clock, store)
    }

    fn counter(store: &MemoryStore, key: &str) -> Option<u64> {
        match store.get(key) {
            Some(CacheValue::Counter(count)) => Some(count),
            _ => None,
        }
    }

    #[test]
    fn test_put_then_get_until_expiry() {
        let (clock, store) = store();
        store.put("k", CacheValue::Counter(7), MINUTE);

        assert_eq!(counter(&store, "k"), Some(7));

        clock.advance(Duration::from_secs(59));
        assert_eq!(counter(&store, "k"), Some(7));

        clock.advance(Duration::from_secs(1));
        assert_eq!(counter(&store, "k"), None);
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_expiring() {
        let (clock, store) = store();
        store.put("k", CacheValue::Counter(1), Duration::from_secs(u64::MAX));

        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(counter(&store, "k"), Some(1));
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn test_put_overwrites() {
        let (_, store) = store();
        let response = Arc::new(CachedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"{}"),
        });

        store.put("k", CacheValue::Counter(1), MINUTE);
        store.put("k", CacheValue::Response(response), MINUTE);

        assert!(matches!(store.get("k"), Some(CacheValue::Response(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_increment_starts_at_one() {
        let (clock, store) = store();

        let hit = store.increment_within("rate_limit:1.2.3.4", 100, MINUTE).unwrap();

        assert_eq!(hit.count, 1);
        assert_eq!(hit.expires_at, clock.now() + chrono::Duration::seconds(60));
    }

    #[test]
    fn test_increment_refuses_at_max_without_touching_entry() {
        let (clock, store) = store();
        for _ in 0..3 {
            store.increment_within("c", 3, MINUTE).unwrap();
        }
        let expiry_before = clock.now() + chrono::Duration::seconds(60);

        clock.advance(Duration::from_secs(30));
        let refused = store.increment_within("c", 3, MINUTE).unwrap_err();

        assert_eq!(refused.count, 3);
        assert_eq!(refused.expires_at, expiry_before);
        assert_eq!(counter(&store, "c"), Some(3));
    }

    #[test]
    fn test_increment_window_rolls_with_each_hit() {
        let (clock, store) = store();
        store.increment_within("c", 10, MINUTE).unwrap();

        clock.advance(Duration::from_secs(45));
        store.increment_within("c", 10, MINUTE).unwrap();

        // 90s after the first hit but only 45s after the latest one.
        clock.advance(Duration::from_secs(45));
        assert_eq!(counter(&store, "c"), Some(2));

        clock.advance(Duration::from_secs(15));
        assert_eq!(counter(&store, "c"), None);
        assert_eq!(store.increment_within("c", 10, MINUTE).unwrap().count, 1);
    }

    #[test]
    fn test_forget_reports_live_entries_only() {
        let (clock, store) = store();
        store.put("a", CacheValue::Counter(1), MINUTE);
        store.put("b", CacheValue::Counter(1), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));

        assert!(store.forget("a"));
        assert!(!store.forget("b"));
        assert!(!store.forget("missing"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (clock, store) = store();
        store.put("short", CacheValue::Counter(1), Duration::from_secs(10));
        store.put("long", CacheValue::Counter(1), Duration::from_secs(600));

        clock.advance(Duration::from_secs(11));

        assert_eq!(store.len(), 2);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(counter(&store, "long"), Some(1));
    }
}
