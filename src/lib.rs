//! # Tejelanas API
//!
//! Catalog and workshop-booking REST API for a yarn shop, featuring:
//!
//! - **Catalog**: Products, categories, workshops, FAQs and about-us content
//! - **Rate Limiting**: Per-IP rolling-window counters with `X-RateLimit-*` headers
//! - **Response Cache**: Memoized GET responses keyed by full URL (`X-Cache`)
//! - **Security**: Bearer tokens on every write (allow-list or shared secret)
//! - **Observability**: Request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Request ID → Trace → CORS → Body limit                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  /api/v1: Rate Limit → Bearer Auth (writes) → Cache (GET)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (products, categories, workshops, faqs, about-us) │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │  Catalog (in-process tables) │  CacheStore (TTL entries)    │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::net::SocketAddr;
//!
//! use tejelanas_api::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config.clone());
//!     let app = build_router(state)?;
//!
//!     let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
//!     axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Security Configuration
//!
//! Accept only your own tokens on write routes:
//! ```bash
//! API_TOKENS=token-a,token-b cargo run
//! ```
//!
//! Or check a single shared secret:
//! ```bash
//! AUTH_MODE=shared_secret API_SHARED_SECRET=ipss.get cargo run
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use catalog::Catalog;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
pub use store::{CacheStore, MemoryStore, SharedStore};
