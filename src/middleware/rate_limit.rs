//! Per-IP request counting with a rolling window.
//!
//! # Algorithm
//!
//! Each client IP owns a counter stored under `rate_limit:<ip>` in the shared
//! [`CacheStore`](crate::store::CacheStore). Every forwarded request bumps the
//! counter and pushes its expiry to `window` from now, so the window is
//! anchored to the latest request rather than to a calendar boundary. Once the
//! counter reaches `max_requests`, further requests are rejected until the
//! counter expires. Rejected requests do not touch the counter.
//!
//! The check and the increment happen in one atomic store call, so concurrent
//! requests from one client cannot both slip through with the same count.
//!
//! # Response Headers
//!
//! On forwarded requests:
//! - `X-RateLimit-Limit`: configured maximum
//! - `X-RateLimit-Remaining`: requests left in the current window
//! - `X-RateLimit-Reset`: Unix timestamp at which the counter expires
//!
//! On rejection the response is a 429 JSON body carrying `retry_after`.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::http::{HeaderValue, Request, Response, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use tower::{Layer, Service};
use tracing::{trace, warn};

use super::ip::{TrustedProxyConfig, extract_client_ip};
use crate::metrics;
use crate::store::{CounterHit, SharedStore};

/// Store key prefix for rate-limit counters.
pub const RATE_LIMIT_KEY_PREFIX: &str = "rate_limit:";

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Error type for rate limit layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// The request ceiling cannot be zero.
    ZeroLimit,
    /// The window cannot be shorter than one second.
    ZeroWindow,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::ZeroLimit => write!(
                f,
                "max requests must be greater than 0; leave the layer out for no limiting"
            ),
            RateLimitError::ZeroWindow => write!(f, "window must be at least one second"),
        }
    }
}

impl std::error::Error for RateLimitError {}

/// Rate limiting layer for the Tower middleware stack.
///
/// # Example
///
/// ```rust,ignore
/// let store: SharedStore = Arc::new(MemoryStore::new());
/// let layer = RateLimitLayer::new(store, 100, Duration::from_secs(60), &[])?;
/// let app = Router::new()
///     .route("/api/v1/products", get(handler))
///     .layer(layer);
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    store: SharedStore,
    max_requests: u64,
    window: Duration,
    trusted_proxies: Arc<TrustedProxyConfig>,
}

impl RateLimitLayer {
    /// Create a per-IP rate limit layer.
    ///
    /// # Arguments
    ///
    /// * `store` - Store holding the counters
    /// * `max_requests` - Requests allowed per window and IP
    /// * `window` - Rolling window length (whole seconds)
    /// * `trusted_proxies` - CIDR ranges whose forwarding headers are believed
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] when `max_requests` is 0 or `window` is
    /// shorter than a second.
    pub fn new(
        store: SharedStore,
        max_requests: u64,
        window: Duration,
        trusted_proxies: &[String],
    ) -> Result<Self, RateLimitError> {
        if max_requests == 0 {
            return Err(RateLimitError::ZeroLimit);
        }
        if window.as_secs() == 0 {
            return Err(RateLimitError::ZeroWindow);
        }

        Ok(Self {
            store,
            max_requests,
            window,
            trusted_proxies: Arc::new(TrustedProxyConfig::new(trusted_proxies)),
        })
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            store: self.store.clone(),
            max_requests: self.max_requests,
            window: self.window,
            trusted_proxies: self.trusted_proxies.clone(),
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    store: SharedStore,
    max_requests: u64,
    window: Duration,
    trusted_proxies: Arc<TrustedProxyConfig>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let max_requests = self.max_requests;
        let window = self.window;
        let mut inner = self.inner.clone();

        let client_ip = extract_client_ip(&req, &self.trusted_proxies);
        let key = format!("{RATE_LIMIT_KEY_PREFIX}{client_ip}");
        let outcome = self.store.increment_within(&key, max_requests, window);

        Box::pin(async move {
            match outcome {
                Ok(hit) => {
                    trace!(client_ip = %client_ip, count = hit.count, "Request counted");
                    let mut response = inner.call(req).await?;
                    apply_rate_limit_headers(&mut response, max_requests, hit);
                    Ok(response)
                }
                Err(current) => {
                    warn!(
                        client_ip = %client_ip,
                        path = %req.uri().path(),
                        count = current.count,
                        retry_after_secs = window.as_secs(),
                        "Rate limit exceeded for IP"
                    );
                    metrics::record_rate_limit_rejection();
                    Ok(too_many_requests(max_requests, window))
                }
            }
        })
    }
}

fn apply_rate_limit_headers(response: &mut Response<Body>, max_requests: u64, hit: CounterHit) {
    let remaining = max_requests.saturating_sub(hit.count);
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(max_requests));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(hit.expires_at.timestamp()));
}

/// Human-readable limit for the rejection message.
fn describe_window(max_requests: u64, window: Duration) -> String {
    match window.as_secs() {
        60 => format!("Demasiadas solicitudes. Límite: {max_requests} por minuto."),
        secs => format!("Demasiadas solicitudes. Límite: {max_requests} cada {secs} segundos."),
    }
}

fn too_many_requests(max_requests: u64, window: Duration) -> Response<Body> {
    let body = json!({
        "error": "Rate limit exceeded",
        "message": describe_window(max_requests, window),
        "retry_after": window.as_secs(),
    });
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::body::to_bytes;
    use axum::extract::ConnectInfo;
    use axum::routing::get;
    use chrono::DateTime;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::store::{CacheStore, CacheValue, Clock, ManualClock, MemoryStore};

    const MINUTE: Duration = Duration::from_secs(60);

    struct Harness {
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        app: Router,
    }

    fn harness(max_requests: u64) -> Harness {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_750_000_000, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let layer = RateLimitLayer::new(store.clone(), max_requests, MINUTE, &[]).unwrap();
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }).post(|| async { "posted" }))
            .route("/other", get(|| async { "other" }))
            .layer(layer);
        Harness { clock, store, app }
    }

    fn request_from(ip: &str, path: &str) -> Request<Body> {
        let mut req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let addr: SocketAddr = format!("{ip}:40000").parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    fn header(response: &Response<Body>, name: &str) -> Option<String> {
        response
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_zero_limit_returns_error() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let result = RateLimitLayer::new(store.clone(), 0, MINUTE, &[]);
        assert!(matches!(result, Err(RateLimitError::ZeroLimit)));

        let result = RateLimitLayer::new(store, 10, Duration::from_millis(500), &[]);
        assert!(matches!(result, Err(RateLimitError::ZeroWindow)));
    }

    #[test]
    fn test_rejection_message_wording() {
        assert_eq!(
            describe_window(100, MINUTE),
            "Demasiadas solicitudes. Límite: 100 por minuto."
        );
        assert_eq!(
            describe_window(5, Duration::from_secs(10)),
            "Demasiadas solicitudes. Límite: 5 cada 10 segundos."
        );
    }

    #[tokio::test]
    async fn test_remaining_decreases_then_rejects() {
        let h = harness(100);
        let reset = (h.clock.now() + chrono::Duration::seconds(60)).timestamp();

        for i in 1..=100u64 {
            let response = h
                .app
                .clone()
                .oneshot(request_from("203.0.113.5", "/ping"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(header(&response, LIMIT_HEADER).as_deref(), Some("100"));
            assert_eq!(header(&response, REMAINING_HEADER), Some((100 - i).to_string()));
            assert_eq!(header(&response, RESET_HEADER), Some(reset.to_string()));
        }

        // Path does not matter: the counter is per IP.
        let response = h
            .app
            .clone()
            .oneshot(request_from("203.0.113.5", "/other"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(header(&response, LIMIT_HEADER).is_none());

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Rate limit exceeded");
        assert_eq!(body["message"], "Demasiadas solicitudes. Límite: 100 por minuto.");
        assert_eq!(body["retry_after"], 60);
    }

    #[tokio::test]
    async fn test_rejection_leaves_counter_untouched() {
        let h = harness(2);
        for _ in 0..4 {
            let _ = h
                .app
                .clone()
                .oneshot(request_from("198.51.100.1", "/ping"))
                .await
                .unwrap();
        }

        match h.store.get("rate_limit:198.51.100.1") {
            Some(CacheValue::Counter(count)) => assert_eq!(count, 2),
            other => panic!("unexpected store value: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ips_have_separate_counters() {
        let h = harness(1);

        let first = h.app.clone().oneshot(request_from("10.0.0.1", "/ping")).await.unwrap();
        let second = h.app.clone().oneshot(request_from("10.0.0.2", "/ping")).await.unwrap();
        let again = h.app.clone().oneshot(request_from("10.0.0.1", "/ping")).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_counter_resets_after_window() {
        let h = harness(1);

        let ok = h.app.clone().oneshot(request_from("10.0.0.9", "/ping")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let limited = h.app.clone().oneshot(request_from("10.0.0.9", "/ping")).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        h.clock.advance(MINUTE);

        let response = h.app.clone().oneshot(request_from("10.0.0.9", "/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, REMAINING_HEADER).as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_all_methods_are_counted() {
        let h = harness(1);

        let post = Request::builder()
            .method("POST")
            .uri("/ping")
            .extension(ConnectInfo::<SocketAddr>("10.0.0.3:1".parse().unwrap()))
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(post).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = h.app.clone().oneshot(request_from("10.0.0.3", "/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
