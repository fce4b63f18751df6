//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │ Request ID/Trace │ ← x-request-id, HTTP spans, CORS, body limit
//! └────────┬─────────┘
//!          │  /api/v1 only
//!          ▼
//! ┌──────────────────┐
//! │  Rate Limiting   │ ← 429 if exceeded
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Bearer Auth    │ ← 401 if invalid (POST/PUT/DELETE routes)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Response Cache  │ ← X-Cache: HIT/MISS (GET routes)
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Route Groups
//!
//! - `/health`, `/stats` - Monitoring (no rate limit, no cache)
//! - `/api/v1/products`, `/api/v1/products-services`
//! - `/api/v1/categories`
//! - `/api/v1/workshops`
//! - `/api/v1/faqs`
//! - `/api/v1/about-us`

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{MethodRouter, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AuthMode, Config};
use crate::handlers;
use crate::middleware::{
    BearerAuthLayer, BearerPolicy, RateLimitError, RateLimitLayer, ResponseCacheLayer,
};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// # Middleware Configuration
///
/// - **Rate Limiting**: Enabled if `rate_limit_max_requests > 0`
/// - **Response Cache**: Enabled if `cache_ttl > 0`
/// - **Authentication**: Always on for writes, mode from `auth_mode`
/// - **CORS**: Configured from `cors_allowed_origins`
///
/// # Errors
///
/// Returns `RateLimitError` if rate limiting configuration is invalid.
pub fn build_router(state: AppState) -> Result<Router, RateLimitError> {
    let config = state.config.clone();

    // =========================================================================
    // Per-route layers
    // =========================================================================
    let cache = if config.response_cache_enabled() {
        info!(ttl_secs = config.cache_ttl.as_secs(), "Response cache enabled");
        Some(ResponseCacheLayer::new(state.store.clone(), config.cache_ttl))
    } else {
        info!("Response cache disabled (CACHE_TTL_SECS=0)");
        None
    };

    info!(mode = %config.auth_mode, "Bearer authentication enabled for writes");
    let auth = BearerAuthLayer::new(bearer_policy(&config));

    let reads = |route: MethodRouter<AppState>| match &cache {
        Some(layer) => route.route_layer(layer.clone()),
        None => route,
    };
    let writes = |route: MethodRouter<AppState>| route.route_layer(auth.clone());

    // =========================================================================
    // API Routes
    // =========================================================================
    let mut api = Router::new()
        // Products
        .route(
            "/products",
            reads(get(handlers::list_products)).merge(writes(post(handlers::create_product))),
        )
        .route(
            "/products/{id}",
            reads(get(handlers::get_product)).merge(writes(
                put(handlers::update_product).delete(handlers::delete_product),
            )),
        )
        .route("/products-services", reads(get(handlers::products_services)))
        // Categories
        .route(
            "/categories",
            reads(get(handlers::list_categories)).merge(writes(post(handlers::create_category))),
        )
        .route(
            "/categories/{id}",
            reads(get(handlers::get_category)).merge(writes(
                put(handlers::update_category).delete(handlers::delete_category),
            )),
        )
        // Workshops
        .route(
            "/workshops",
            reads(get(handlers::list_workshops)).merge(writes(post(handlers::create_workshop))),
        )
        .route(
            "/workshops/{id}",
            reads(get(handlers::get_workshop)).merge(writes(
                put(handlers::update_workshop).delete(handlers::delete_workshop),
            )),
        )
        // FAQs
        .route(
            "/faqs",
            reads(get(handlers::list_faqs)).merge(writes(post(handlers::create_faq))),
        )
        .route(
            "/faqs/{id}",
            reads(get(handlers::get_faq))
                .merge(writes(put(handlers::update_faq).delete(handlers::delete_faq))),
        )
        // About us
        .route(
            "/about-us",
            reads(get(handlers::list_about_us)).merge(writes(post(handlers::create_about_us))),
        )
        .route(
            "/about-us/{id}",
            reads(get(handlers::get_about_us)).merge(writes(
                put(handlers::update_about_us).delete(handlers::delete_about_us),
            )),
        );

    // Rate limiting wraps the whole API group, ahead of auth and cache
    if config.rate_limiting_enabled() {
        info!(
            max_requests = config.rate_limit_max_requests,
            window_secs = config.rate_limit_window.as_secs(),
            trusted_proxies = config.trusted_proxies.len(),
            "Rate limiting enabled"
        );
        api = api.layer(RateLimitLayer::new(
            state.store.clone(),
            config.rate_limit_max_requests,
            config.rate_limit_window,
            &config.trusted_proxies,
        )?);
    } else {
        info!("Rate limiting disabled (RATE_LIMIT_MAX_REQUESTS=0)");
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::stats))
        .nest("/api/v1", api);

    // =========================================================================
    // Outer Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Request body size limit
    info!(
        max_size_kb = config.max_request_body_size / 1024,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. CORS
    router = router.layer(build_cors_layer(&config.cors_allowed_origins));

    // 3. Tracing
    router = router.layer(TraceLayer::new_for_http());

    // 4. Request ID: generated (or kept) on the way in, echoed on the way out
    router = router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    Ok(router.with_state(state))
}

/// Token check for write routes.
fn bearer_policy(config: &Config) -> BearerPolicy {
    match config.auth_mode {
        AuthMode::AllowList => BearerPolicy::allow_list(
            config
                .api_tokens
                .iter()
                .filter(|t| !t.trim().is_empty())
                .cloned(),
        ),
        AuthMode::SharedSecret => BearerPolicy::shared_secret(config.shared_secret.clone()),
    }
}

/// Build CORS layer from configuration.
///
/// `*` allows any origin; otherwise only the listed origins that parse as
/// header values are allowed.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
