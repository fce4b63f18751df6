//! Shared application state for Axum handlers.
//!
//! This module provides thread-safe, clonable state that is shared across
//! all request handlers. It includes:
//!
//! - **Catalog**: In-process tables for products, categories, workshops, FAQs
//!   and about-us sections
//! - **Store**: The TTL key-value store behind the rate limiter and the
//!   response cache
//! - **Configuration**: Runtime configuration access
//!
//! # Structured Concurrency
//!
//! Background tasks are managed using `tokio_util::task::TaskTracker` and
//! `CancellationToken` for proper lifecycle management. Call `shutdown()`
//! to gracefully stop all background tasks before application exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::metrics;
use crate::store::{MemoryStore, SharedStore};

/// Shared application state for Axum handlers.
///
/// This struct is cloned for each request handler. All internal data
/// is wrapped in `Arc` for efficient sharing.
///
/// # Lifecycle
///
/// The purge task is spawned when the state is created. Call `shutdown()`
/// before dropping to ensure clean task termination:
///
/// ```rust,ignore
/// let state = AppState::new(config);
/// // ... use state ...
/// state.shutdown().await;  // Wait for background tasks to complete
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Catalog tables
    pub catalog: Catalog,
    /// Store shared by the rate limiter and the response cache
    pub store: SharedStore,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Tracks spawned background tasks for graceful shutdown
    task_tracker: TaskTracker,
    /// Cancellation token for signaling background tasks to stop
    cancellation_token: CancellationToken,
}

impl AppState {
    /// Create state backed by an in-process [`MemoryStore`].
    ///
    /// Must be called inside a Tokio runtime: the expired-entry purge task is
    /// spawned here.
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create state around an existing store (tests inject one with a
    /// manual clock).
    pub fn with_store(config: Config, store: SharedStore) -> Self {
        let catalog = if config.seed_data {
            Catalog::seeded(Utc::now().date_naive())
        } else {
            Catalog::new()
        };

        let state = Self {
            config: Arc::new(config),
            catalog,
            store,
            started_at: Instant::now(),
            task_tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
        };

        state.spawn_purge_task();

        state
    }

    /// Spawn the background sweep of expired store entries.
    ///
    /// Expired entries are already invisible to readers; the sweep only
    /// bounds memory and keeps the entry gauge current.
    fn spawn_purge_task(&self) {
        let store = self.store.clone();
        let period: Duration = self.config.cache_purge_interval;
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    biased; // Check cancellation first

                    _ = cancel.cancelled() => {
                        debug!("Store purge task received cancellation signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = store.purge_expired();
                        let remaining = store.len();
                        metrics::set_cache_entries(remaining);
                        trace!(removed, remaining, "Purged expired store entries");
                    }
                }
            }

            debug!("Store purge task shutting down");
        });
    }

    /// Gracefully shutdown all background tasks.
    ///
    /// This method:
    /// 1. Signals all tasks to stop via cancellation token
    /// 2. Closes the task tracker (prevents new tasks)
    /// 3. Waits for all tasks to complete
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of background tasks");

        self.cancellation_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("All background tasks have completed");
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
