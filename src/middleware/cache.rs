//! Response memoization for GET requests.
//!
//! # Keying
//!
//! The key is `api_cache:` followed by the hex SHA-256 digest of the full
//! request URL (`scheme://host/path?query`). The query string is used exactly
//! as received, so `?a=1&b=2` and `?b=2&a=1` are distinct entries.
//!
//! # Behaviour
//!
//! - Non-GET requests bypass the cache entirely: no lookup, no store, no headers.
//! - Hit: the stored status, headers and body are replayed with
//!   `X-Cache: HIT` and `X-Cache-Key`; the inner service is not called.
//! - Miss: the inner service runs. A `200 OK` response is buffered and stored
//!   for the configured TTL and gets `X-Cache: MISS` plus `X-Cache-TTL`. Any
//!   other status passes through untouched apart from `X-Cache-Key`.
//!
//! Entries are shared between callers: the key carries no identity.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::extract::OriginalUri;
use axum::http::{HeaderValue, Method, Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use sha2::{Digest, Sha256};
use tower::{Layer, Service};
use tracing::{debug, error};

use crate::error::AppError;
use crate::metrics;
use crate::store::{CacheValue, CachedResponse, SharedStore};

/// Store key prefix for cached responses.
pub const CACHE_KEY_PREFIX: &str = "api_cache:";

pub const CACHE_HEADER: &str = "x-cache";
pub const CACHE_KEY_HEADER: &str = "x-cache-key";
pub const CACHE_TTL_HEADER: &str = "x-cache-ttl";

/// Full URL of a request as seen by the client.
///
/// Uses the pre-nesting URI when the router was nested, the `Host` header for
/// the authority, and defaults to `http://localhost`.
pub fn full_url<B>(req: &Request<B>) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map_or(req.uri(), |original| &original.0);

    let scheme = uri.scheme_str().unwrap_or("http");
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    format!("{scheme}://{host}{path_and_query}")
}

/// Store key for a full URL.
pub fn cache_key(full_url: &str) -> String {
    let digest = Sha256::digest(full_url.as_bytes());
    format!("{CACHE_KEY_PREFIX}{}", hex::encode(digest))
}

/// Response cache layer for the Tower middleware stack.
///
/// # Example
///
/// ```rust,ignore
/// let cache = ResponseCacheLayer::new(store, Duration::from_secs(300));
/// let route = get(list_products).route_layer(cache);
/// ```
#[derive(Clone)]
pub struct ResponseCacheLayer {
    store: SharedStore,
    ttl: Duration,
}

impl ResponseCacheLayer {
    pub fn new(store: SharedStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

impl<S> Layer<S> for ResponseCacheLayer {
    type Service = ResponseCacheService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseCacheService {
            inner,
            store: self.store.clone(),
            ttl: self.ttl,
        }
    }
}

/// Response cache service wrapper.
#[derive(Clone)]
pub struct ResponseCacheService<S> {
    inner: S,
    store: SharedStore,
    ttl: Duration,
}

impl<S> Service<Request<Body>> for ResponseCacheService<S>
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
        let mut inner = self.inner.clone();

        if req.method() != Method::GET {
            return Box::pin(async move { inner.call(req).await });
        }

        let store = self.store.clone();
        let ttl = self.ttl;
        let url = full_url(&req);
        let key = cache_key(&url);

        if let Some(CacheValue::Response(cached)) = store.get(&key) {
            debug!(url = %url, key = %key, "Cache hit");
            metrics::record_cache_lookup(true);
            return Box::pin(async move { Ok(replay(&cached, &key)) });
        }

        metrics::record_cache_lookup(false);

        Box::pin(async move {
            let response = inner.call(req).await?;
            let key_value = header_value(&key);

            if response.status() != StatusCode::OK {
                debug!(url = %url, status = response.status().as_u16(), "Response not cacheable");
                let mut response = response;
                response.headers_mut().insert(CACHE_KEY_HEADER, key_value);
                return Ok(response);
            }

            let (mut parts, body) = response.into_parts();
            let body = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(url = %url, error = %e, "Failed to buffer response body for caching");
                    return Ok(AppError::Internal(format!("response body: {e}")).into_response());
                }
            };

            store.put(
                &key,
                CacheValue::Response(Arc::new(CachedResponse {
                    status: parts.status,
                    headers: parts.headers.clone(),
                    body: body.clone(),
                })),
                ttl,
            );
            metrics::record_cache_store();
            debug!(url = %url, key = %key, ttl_secs = ttl.as_secs(), "Cache miss, response stored");

            parts.headers.insert(CACHE_HEADER, HeaderValue::from_static("MISS"));
            parts.headers.insert(CACHE_TTL_HEADER, HeaderValue::from(ttl.as_secs()));
            parts.headers.insert(CACHE_KEY_HEADER, key_value);

            Ok(Response::from_parts(parts, Body::from(body)))
        })
    }
}

/// Rebuild a response from a stored entry.
fn replay(cached: &CachedResponse, key: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(cached.body.clone()));
    *response.status_mut() = cached.status;
    *response.headers_mut() = cached.headers.clone();

    let headers = response.headers_mut();
    headers.insert(CACHE_HEADER, HeaderValue::from_static("HIT"));
    headers.insert(CACHE_KEY_HEADER, header_value(key));
    response
}

fn header_value(key: &str) -> HeaderValue {
    // Prefix plus hex digest is always visible ASCII.
    HeaderValue::from_str(key).unwrap_or_else(|_| HeaderValue::from_static(CACHE_KEY_PREFIX))
}
