//! Application configuration loaded from environment variables.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::query::QueryConfig;

/// Largest page size the API accepts.
pub const MAX_LIMIT: usize = 1000;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Upstream ===
    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub clob_api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Retry attempts per upstream page request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum number of cursor pages followed per fetch.
    #[serde(default = "default_fetch_max_pages")]
    pub fetch_max_pages: u32,

    // === Query ===
    /// Page size used when a request does not specify one.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS (comma separated in the environment).
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Expose Prometheus metrics at /metrics.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_fetch_max_pages() -> u32 {
    1
}

fn default_limit() -> usize {
    50
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5000".to_string(),
        "http://127.0.0.1:5000".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clob_api_url: default_clob_url(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            fetch_max_pages: default_fetch_max_pages(),
            default_limit: default_limit(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            metrics_enabled: default_true(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> std::result::Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Replace the CLOB API URL when an override is given.
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.clob_api_url = url;
        }
        self
    }

    /// Validate, handing the configuration back on success.
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(AppError::InvalidConfig)?;
        Ok(self)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let url = Url::parse(&self.clob_api_url)
            .map_err(|e| format!("CLOB_API_URL is not a valid URL: {}", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "CLOB_API_URL must use http or https: {}",
                self.clob_api_url
            ));
        }

        if self.request_timeout == 0 {
            return Err("REQUEST_TIMEOUT must be a positive integer".to_string());
        }

        if self.default_limit == 0 || self.default_limit > MAX_LIMIT {
            return Err(format!("DEFAULT_LIMIT must be between 1 and {}", MAX_LIMIT));
        }

        if self.fetch_max_pages == 0 {
            return Err("FETCH_MAX_PAGES must be at least 1".to_string());
        }

        Ok(())
    }

    /// Settings handed to the query engine.
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            default_limit: self.default_limit,
        }
    }

    /// Configuration that is safe to show to API clients.
    pub fn public_view(&self) -> PublicConfig {
        PublicConfig {
            clob_api_url: self.clob_api_url.clone(),
            request_timeout: self.request_timeout,
            max_retries: self.max_retries,
            default_limit: self.default_limit,
            log_level: self.rust_log.clone(),
        }
    }
}

/// Non-sensitive configuration subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicConfig {
    /// CLOB API base URL.
    pub clob_api_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Retry attempts.
    pub max_retries: u32,
    /// Default page size.
    pub default_limit: usize,
    /// Log level.
    pub log_level: String,
}
