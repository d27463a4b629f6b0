//! # Client Configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.
//!
//! ## Variables
//! ```text
//! RETAIL_API_BASE            required  e.g. https://acme.retail.example/api/2.0
//! RETAIL_API_TOKEN           required  bearer token for the platform API
//! REPORT_TIMEZONE            optional  IANA zone, default America/New_York
//! REPORT_PAGE_SIZE           optional  search page size, default 200
//! REPORT_MAX_PAGES           optional  pagination safety limit, default 1000
//! RETAIL_HTTP_TIMEOUT_SECS   optional  per-request timeout, default 30
//! ```

use std::env;

use chrono_tz::Tz;
use tally_core::DEFAULT_TIMEZONE;

/// Default search page size.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Default pagination safety limit. Large enough that production volumes
/// never hit it; it exists to bound a runaway cursor, not to cap reports.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Default per-request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Retail platform client configuration.
#[derive(Debug, Clone)]
pub struct RetailConfig {
    /// Base URL of the platform API, up to and including the version
    /// segment (no trailing slash required).
    pub api_base: String,

    /// Bearer token for the platform API.
    pub api_token: String,

    /// Reporting time zone. Day buckets and window boundaries are local
    /// to this zone.
    pub timezone: Tz,

    /// Records per search page.
    pub page_size: usize,

    /// Maximum successful pages fetched per report.
    pub max_pages: usize,

    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl RetailConfig {
    /// Builds a config with defaults for everything but the endpoint.
    pub fn new(api_base: impl Into<String>, api_token: impl Into<String>) -> Self {
        RetailConfig {
            api_base: api_base.into(),
            api_token: api_token.into(),
            timezone: default_timezone(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let api_base = env::var("RETAIL_API_BASE")
            .map_err(|_| ConfigError::MissingRequired("RETAIL_API_BASE".to_string()))?;

        let api_token = env::var("RETAIL_API_TOKEN")
            .map_err(|_| ConfigError::MissingRequired("RETAIL_API_TOKEN".to_string()))?;

        let timezone = match env::var("REPORT_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidValue("REPORT_TIMEZONE".to_string()))?,
            Err(_) => default_timezone(),
        };

        let page_size = env::var("REPORT_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("REPORT_PAGE_SIZE".to_string()))?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue("REPORT_PAGE_SIZE".to_string()));
        }

        let max_pages = env::var("REPORT_MAX_PAGES")
            .unwrap_or_else(|_| DEFAULT_MAX_PAGES.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("REPORT_MAX_PAGES".to_string()))?;

        let http_timeout_secs = env::var("RETAIL_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RETAIL_HTTP_TIMEOUT_SECS".to_string()))?;

        Ok(RetailConfig {
            api_base,
            api_token,
            timezone,
            page_size,
            max_pages,
            http_timeout_secs,
        })
    }
}

fn default_timezone() -> Tz {
    // The fallback zone name is a compile-time constant; it always parses.
    DEFAULT_TIMEZONE.parse().unwrap_or(chrono_tz::UTC)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
