//! Application configuration loaded from environment variables.
//!
//! All configuration is loaded from environment variables with defaults suited
//! to local development. In production, configure via environment variables or
//! a `.env` file.
//!
//! # Middleware Configuration
//!
//! - `RATE_LIMIT_MAX_REQUESTS` / `RATE_LIMIT_WINDOW_SECS`: requests allowed per
//!   client IP inside a rolling window (default: 100 per 60s, 0 disables)
//! - `CACHE_TTL_SECS`: lifetime of memoized GET responses (default: 300, 0 disables)
//! - `AUTH_MODE`: `allowlist` (default) or `shared_secret`
//! - `API_TOKENS`: comma-separated tokens accepted in allow-list mode
//! - `API_SHARED_SECRET`: the single token accepted in shared-secret mode

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Tokens accepted in allow-list mode when `API_TOKENS` is not set.
pub const DEFAULT_API_TOKENS: [&str; 3] = [
    "tejelanas_admin_token_2025",
    "development_token_123",
    "test_token_456",
];

/// Secret accepted in shared-secret mode when `API_SHARED_SECRET` is not set.
pub const DEFAULT_SHARED_SECRET: &str = "ipss.get";

/// How write routes authenticate bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Token must be a member of `api_tokens`.
    #[default]
    AllowList,
    /// Token must equal `shared_secret`.
    SharedSecret,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allowlist" | "allow_list" | "allow-list" => Ok(AuthMode::AllowList),
            "shared_secret" | "shared-secret" | "secret" => Ok(AuthMode::SharedSecret),
            other => Err(format!(
                "unknown auth mode '{other}' (expected 'allowlist' or 'shared_secret')"
            )),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::AllowList => f.write_str("allowlist"),
            AuthMode::SharedSecret => f.write_str("shared_secret"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected 'text' or 'json')")),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    /// Maximum request body size in bytes (default: 1MB)
    pub max_request_body_size: usize,

    /// Comma-separated list of allowed CORS origins ("*" allows any)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Requests allowed per client IP per window (default: 100, 0 = disabled)
    pub rate_limit_max_requests: u64,

    /// Rolling window length; the counter expires this long after the latest
    /// admitted request (default: 60s)
    pub rate_limit_window: Duration,

    /// Trusted proxy CIDR ranges. `X-Forwarded-For` / `X-Real-IP` are only
    /// honoured when the peer address falls inside one of these ranges.
    ///
    /// Format: Comma-separated CIDR notation (e.g., "10.0.0.0/8,172.16.0.0/12")
    /// Default: Empty (forwarding headers ignored, peer address used)
    pub trusted_proxies: Vec<String>,

    // =========================================================================
    // Response Cache Configuration
    // =========================================================================
    /// Lifetime of cached GET responses (default: 300s, 0 = disabled)
    pub cache_ttl: Duration,

    /// Interval of the background sweep of expired store entries (default: 60s)
    pub cache_purge_interval: Duration,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Bearer token check applied to write routes
    pub auth_mode: AuthMode,

    /// Tokens accepted in allow-list mode
    pub api_tokens: Vec<String>,

    /// Token accepted in shared-secret mode
    pub shared_secret: String,

    // =========================================================================
    // Data & Observability Configuration
    // =========================================================================
    /// Load demonstration catalog data at startup (default: true)
    pub seed_data: bool,

    /// Log level filter (e.g., "info", "debug", "tejelanas_api=trace")
    pub log_level: String,

    /// Log output format (default: text)
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value fails to parse or the
    /// resulting configuration is inconsistent.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8000)?,
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?,
            cors_allowed_origins: Self::parse_list("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| vec!["*".to_string()]),

            // Rate limiting
            rate_limit_max_requests: Self::parse_env("RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window: Duration::from_secs(Self::parse_env("RATE_LIMIT_WINDOW_SECS", 60)?),
            trusted_proxies: Self::parse_list("TRUSTED_PROXIES").unwrap_or_default(),

            // Response cache
            cache_ttl: Duration::from_secs(Self::parse_env("CACHE_TTL_SECS", 300)?),
            cache_purge_interval: Duration::from_secs(Self::parse_env(
                "CACHE_PURGE_INTERVAL_SECS",
                60,
            )?),

            // Security
            auth_mode: Self::parse_env("AUTH_MODE", AuthMode::AllowList)?,
            api_tokens: Self::parse_list("API_TOKENS").unwrap_or_else(default_tokens),
            shared_secret: env::var("API_SHARED_SECRET")
                .unwrap_or_else(|_| DEFAULT_SHARED_SECRET.to_string()),

            // Data & observability
            seed_data: Self::parse_env("SEED_DATA", true)?,
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", LogFormat::Text)?,
            metrics_port: Self::parse_env("METRICS_PORT", 0)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.rate_limit_window.is_zero() {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_WINDOW_SECS must be greater than 0".to_string(),
            ));
        }

        if self.cache_purge_interval.is_zero() {
            return Err(AppError::ConfigError(
                "CACHE_PURGE_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        match self.auth_mode {
            AuthMode::AllowList if self.api_tokens.iter().all(|t| t.trim().is_empty()) => {
                Err(AppError::ConfigError(
                    "API_TOKENS must contain at least one token in allowlist mode".to_string(),
                ))
            }
            AuthMode::SharedSecret if self.shared_secret.is_empty() => Err(AppError::ConfigError(
                "API_SHARED_SECRET must not be empty in shared_secret mode".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if rate limiting is enabled.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_max_requests > 0
    }

    /// Check if the GET response cache is enabled.
    pub fn response_cache_enabled(&self) -> bool {
        !self.cache_ttl.is_zero()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a comma-separated list, or `None` when the variable is unset or blank.
    fn parse_list(name: &str) -> Option<Vec<String>> {
        env::var(name)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
    }
}

fn default_tokens() -> Vec<String> {
    DEFAULT_API_TOKENS.iter().map(|t| (*t).to_string()).collect()
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_request_body_size: 1024 * 1024,
            cors_allowed_origins: vec!["*".to_string()],
            rate_limit_max_requests: 100,
            rate_limit_window: Duration::from_secs(60),
            trusted_proxies: vec![],
            cache_ttl: Duration::from_secs(300),
            cache_purge_interval: Duration::from_secs(60),
            auth_mode: AuthMode::AllowList,
            api_tokens: default_tokens(),
            shared_secret: DEFAULT_SHARED_SECRET.to_string(),
            seed_data: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_port: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.port, 8000);
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.auth_mode, AuthMode::AllowList);
        assert!(config.api_tokens.contains(&"development_token_123".to_string()));
        assert_eq!(config.shared_secret, "ipss.get");
        assert!(!config.metrics_enabled());
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_feature_switches() {
        let config = Config {
            rate_limit_max_requests: 0,
            cache_ttl: Duration::ZERO,
            metrics_port: 9100,
            ..Config::default()
        };

        assert!(!config.rate_limiting_enabled());
        assert!(!config.response_cache_enabled());
        assert_eq!(config.metrics_addr().unwrap().port(), 9100);
    }

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!("allowlist".parse::<AuthMode>().unwrap(), AuthMode::AllowList);
        assert_eq!(" Shared_Secret ".parse::<AuthMode>().unwrap(), AuthMode::SharedSecret);
        assert!("oauth".parse::<AuthMode>().is_err());
        assert_eq!(AuthMode::SharedSecret.to_string(), "shared_secret");
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_validate_zero_window() {
        let config = Config {
            rate_limit_window: Duration::ZERO,
            ..Config::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_WINDOW_SECS"));
    }

    #[test]
    fn test_validate_allowlist_needs_tokens() {
        let config = Config {
            api_tokens: vec![" ".to_string()],
            ..Config::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("API_TOKENS"));
    }

    #[test]
    fn test_validate_shared_secret_needs_secret() {
        let config = Config {
            auth_mode: AuthMode::SharedSecret,
            shared_secret: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        // An empty token list is irrelevant in shared-secret mode.
        let config = Config {
            auth_mode: AuthMode::SharedSecret,
            api_tokens: vec![],
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }
}
