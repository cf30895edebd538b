//! Directory configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::state::DEFAULT_QUIET_INTERVAL_MS;

/// Base URL of the hosted record service.
pub const DEFAULT_API_URL: &str = "https://www.preggifyapiservice.preggify.com/preggify/v1/hospitals";

/// Regions per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("Unsupported base URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Page size must be at least 1")]
    ZeroPageSize,

    #[error("Request timeout must be non-zero")]
    ZeroRequestTimeout,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Directory configuration.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL of the record service (endpoints are appended to it)
    pub base_url: String,
    /// Serve from the bundled fallback dataset instead of the record service.
    /// Read once when the source is constructed.
    pub use_fallback: bool,
    /// Regions per listing page
    pub page_size: u32,
    /// Per-request timeout for the record service
    pub request_timeout: Duration,
    /// Quiet interval for free-text search input
    pub quiet_interval: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("HOSPITAL_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            use_fallback: std::env::var("HOSPITAL_USE_FALLBACK")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            page_size: std::env::var("HOSPITAL_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PAGE_SIZE),
            request_timeout: Duration::from_secs(
                std::env::var("HOSPITAL_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            quiet_interval: Duration::from_millis(DEFAULT_QUIET_INTERVAL_MS),
        }
    }
}

impl DirectoryConfig {
    /// Configuration serving from the bundled fallback dataset.
    pub fn fallback() -> Self {
        Self {
            use_fallback: true,
            ..Self::default()
        }
    }

    /// Configuration for a record service at `base_url`.
    pub fn live(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            use_fallback: false,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !self.use_fallback {
            if self.request_timeout.is_zero() {
                return Err(ConfigError::ZeroRequestTimeout);
            }
            let url = Url::parse(&self.base_url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
            }
        }
        Ok(())
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
