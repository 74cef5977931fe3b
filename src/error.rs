//! Custom error types for landscape.
//!
//! Every library function returns `Result<T, LandscapeError>`. Nothing is
//! retried or recovered locally: an error aborts the stage that raised it.

use thiserror::Error;

/// Main error type for landscape operations.
#[derive(Debug, Error)]
pub enum LandscapeError {
    /// A client that needs a credential was invoked without one
    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML or payload parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from API
        message: String,
    },

    /// CAPTCHA detected on a scraped page
    #[error("CAPTCHA detected at {0}")]
    Captcha(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An input table lacks a column the stage reads
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn {
        /// Column that was expected
        column: String,
        /// File or table the column was expected in
        source_name: String,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `LandscapeError`
pub type Result<T> = std::result::Result<T, LandscapeError>;
