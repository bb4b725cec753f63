//! Unified error types for the market listing service.

use thiserror::Error;

/// Unified error type for the market listing service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query parameters out of range.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Upstream fetch error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// JSON export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while pulling raw markets from the upstream exchange.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned HTTP {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Response body was not the expected shape.
    #[error("failed to parse markets response: {0}")]
    Parse(String),

    /// Every retry attempt failed.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error observed.
        last: String,
    },

    /// Configured base URL is unusable.
    #[error("invalid upstream url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Raised when a raw record cannot be read as a market at all.
///
/// The normalizer absorbs this into an error-shaped record; it only
/// surfaces through `try_normalize_value` so callers can count it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The raw record was not a JSON object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// JSON export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Could not create or write the file.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("failed to serialize markets: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
