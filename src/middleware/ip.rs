//! Client IP resolution for the rate limiter.
//!
//! # Resolution Order
//!
//! 1. The transport peer address (`ConnectInfo<SocketAddr>`, installed by
//!    `into_make_service_with_connect_info`).
//! 2. If, and only if, that peer lies inside a configured trusted proxy range,
//!    the first entry of `X-Forwarded-For`, then `X-Real-IP`.
//! 3. [`UNKNOWN_IP`] when no peer address is available (e.g. in-process tests
//!    that call the router directly without connect info). Forwarding headers
//!    are honoured in that case only when no trusted ranges are configured.
//!
//! # Security
//!
//! Forwarding headers are client-controlled. Trusting them from arbitrary
//! peers lets a caller pick its own rate-limit bucket, so configure
//! `TRUSTED_PROXIES` with the exact ranges of your reverse proxies.

use std::borrow::Cow;
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::Request;
use tracing::{debug, warn};

/// Fallback IP value when no client IP can be determined.
///
/// All requests without identifiable IPs share this key.
pub const UNKNOWN_IP: &str = "unknown";

// =============================================================================
// Trusted Proxy CIDR Matching
// =============================================================================

/// Parsed CIDR network range for trusted proxy validation.
#[derive(Debug, Clone)]
pub struct CidrRange {
    network: IpAddr,
    prefix_len: u8,
}

impl CidrRange {
    /// Parse a CIDR notation string (e.g., "10.0.0.0/8" or "::1/128").
    ///
    /// A bare address is accepted as a single-host range. Returns `None` if
    /// the format is invalid.
    pub fn parse(cidr: &str) -> Option<Self> {
        let cidr = cidr.trim();
        let (addr, prefix) = match cidr.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (cidr, None),
        };

        let network: IpAddr = addr.parse().ok()?;
        let max_prefix = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        let prefix_len = match prefix {
            Some(p) => p.parse::<u8>().ok().filter(|len| *len <= max_prefix)?,
            None => max_prefix,
        };

        Some(Self {
            network,
            prefix_len,
        })
    }

    /// Check if an IP address is contained within this CIDR range.
    ///
    /// IPv4-mapped IPv6 peers (`::ffff:a.b.c.d`) are compared as IPv4.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(*ip, IpAddr::V4),
            IpAddr::V4(_) => *ip,
        };

        match (&self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix_len)).unwrap_or(0);
                (u32::from(*net) & mask) == (u32::from(addr) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                (u128::from(*net) & mask) == (u128::from(addr) & mask)
            }
            _ => false,
        }
    }
}

/// Set of reverse-proxy ranges whose forwarding headers are believed.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxyConfig {
    ranges: Vec<CidrRange>,
}

impl TrustedProxyConfig {
    /// Build from CIDR strings. Invalid entries are logged and skipped.
    pub fn new(cidrs: &[String]) -> Self {
        let ranges: Vec<CidrRange> = cidrs
            .iter()
            .filter_map(|cidr| {
                let parsed = CidrRange::parse(cidr);
                if parsed.is_none() {
                    warn!(cidr = %cidr, "Invalid CIDR range in TRUSTED_PROXIES, skipping");
                }
                parsed
            })
            .collect();

        if !ranges.is_empty() {
            debug!(count = ranges.len(), "Trusted proxy ranges configured");
        }

        Self { ranges }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Whether `peer` is one of the configured proxies.
    pub fn is_trusted(&self, peer: &IpAddr) -> bool {
        self.ranges.iter().any(|range| range.contains(peer))
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// First address named by the forwarding headers, if any.
fn forwarded_ip<B>(req: &Request<B>) -> Option<&str> {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next().map(str::trim)
        && !first_ip.is_empty()
    {
        return Some(first_ip);
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolve the client IP used as the rate-limit key.
///
/// See the module documentation for the resolution order.
pub fn extract_client_ip<B>(req: &Request<B>, trusted_proxies: &TrustedProxyConfig) -> Cow<'static, str> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match peer {
        Some(peer) if trusted_proxies.is_trusted(&peer) => match forwarded_ip(req) {
            Some(ip) => {
                debug!(client_ip = %ip, proxy = %peer, "Client IP taken from forwarding headers");
                Cow::Owned(ip.to_string())
            }
            None => Cow::Owned(peer.to_string()),
        },
        Some(peer) => Cow::Owned(peer.to_string()),
        None if !trusted_proxies.is_enabled() => forwarded_ip(req)
            .map(|ip| Cow::Owned(ip.to_string()))
            .unwrap_or(Cow::Borrowed(UNKNOWN_IP)),
        None => Cow::Borrowed(UNKNOWN_IP),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_from(peer: Option<&str>, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/products");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            req.extensions_mut().insert(ConnectInfo(addr));
        }
        req
    }

    fn proxies(cidrs: &[&str]) -> TrustedProxyConfig {
        let cidrs: Vec<String> = cidrs.iter().map(|c| (*c).to_string()).collect();
        TrustedProxyConfig::new(&cidrs)
    }

    #[test]
    fn test_peer_address_is_used() {
        let req = request_from(Some("203.0.113.7:51000"), &[]);
        assert_eq!(extract_client_ip(&req, &proxies(&[])), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_header_ignored_from_untrusted_peer() {
        let req = request_from(Some("203.0.113.7:51000"), &[("x-forwarded-for", "1.1.1.1")]);
        assert_eq!(
            extract_client_ip(&req, &proxies(&["10.0.0.0/8"])),
            "203.0.113.7"
        );
    }

    #[test]
    fn test_forwarded_header_used_from_trusted_peer() {
        let req = request_from(
            Some("10.1.2.3:443"),
            &[("x-forwarded-for", "198.51.100.9, 10.1.2.3")],
        );
        assert_eq!(
            extract_client_ip(&req, &proxies(&["10.0.0.0/8"])),
            "198.51.100.9"
        );
    }

    #[test]
    fn test_real_ip_used_from_trusted_peer() {
        let req = request_from(Some("10.1.2.3:443"), &[("x-real-ip", "198.51.100.10")]);
        assert_eq!(
            extract_client_ip(&req, &proxies(&["10.0.0.0/8"])),
            "198.51.100.10"
        );
    }

    #[test]
    fn test_trusted_peer_without_headers_falls_back_to_peer() {
        let req = request_from(Some("10.1.2.3:443"), &[]);
        assert_eq!(extract_client_ip(&req, &proxies(&["10.0.0.0/8"])), "10.1.2.3");
    }

    #[test]
    fn test_no_peer_uses_headers_only_without_trusted_ranges() {
        let req = request_from(None, &[("x-forwarded-for", "192.0.2.1")]);
        assert_eq!(extract_client_ip(&req, &proxies(&[])), "192.0.2.1");
        assert_eq!(
            extract_client_ip(&req, &proxies(&["10.0.0.0/8"])),
            UNKNOWN_IP
        );
    }

    #[test]
    fn test_unknown_fallback() {
        let req = request_from(None, &[]);
        assert_eq!(extract_client_ip(&req, &proxies(&[])), UNKNOWN_IP);
    }

    #[test]
    fn test_cidr_parse() {
        assert_eq!(CidrRange::parse("10.0.0.0/8").unwrap().prefix_len, 8);
        assert_eq!(CidrRange::parse("::1/128").unwrap().prefix_len, 128);
        assert_eq!(CidrRange::parse("192.168.1.1").unwrap().prefix_len, 32);
        assert!(CidrRange::parse("not-an-ip").is_none());
        assert!(CidrRange::parse("10.0.0.0/33").is_none());
    }

    #[test]
    fn test_cidr_contains() {
        let cidr = CidrRange::parse("192.168.1.0/24").unwrap();
        assert!(cidr.contains(&"192.168.1.254".parse().unwrap()));
        assert!(!cidr.contains(&"192.168.2.1".parse().unwrap()));
        assert!(cidr.contains(&"::ffff:192.168.1.9".parse().unwrap()));

        let everything = CidrRange::parse("0.0.0.0/0").unwrap();
        assert!(everything.contains(&"8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_invalid_ranges_are_skipped() {
        let config = proxies(&["bogus", "172.16.0.0/12"]);
        assert!(config.is_enabled());
        assert!(config.is_trusted(&"172.31.255.255".parse().unwrap()));
        assert!(!config.is_trusted(&"8.8.8.8".parse().unwrap()));
    }
}
