//! Error types for data operations.

use eventcar_traits::ProviderError;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP error status
    #[error("HTTP error for {url}: {status}")]
    Http {
        /// Requested URL
        url: String,
        /// Response status
        status: u16,
    },

    /// Data parsing error
    #[error("Data parsing error in {source_name}: {reason}")]
    Parse {
        /// File or table being parsed
        source_name: String,
        /// What was wrong
        reason: String,
    },

    /// Missing data
    #[error("Missing data for {key}: {reason}")]
    MissingData {
        /// What was requested
        key: String,
        /// Reason for missing data
        reason: String,
    },

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Time conversion error
    #[error("Time conversion error: {0}")]
    TimeConversion(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for [`DataError::Parse`].
    pub fn parse(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse { source_name: source_name.into(), reason: reason.to_string() }
    }

    /// Classify as a provider error for `key`.
    #[must_use]
    pub fn into_provider(self, key: &str) -> ProviderError {
        match self {
            Self::MissingData { .. } => ProviderError::no_data(key),
            Self::YahooApi(_) | Self::Network(_) | Self::Http { .. } => {
                ProviderError::transient(key, self)
            }
            Self::Io(err) => ProviderError::Io(err),
            other => ProviderError::malformed(key, other),
        }
    }
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_classification() {
        let missing = DataError::MissingData { key: "1".into(), reason: "empty".into() };
        assert!(missing.into_provider("1").is_no_data());

        let http = DataError::Http { url: "u".into(), status: 503 };
        assert!(matches!(http.into_provider("ff5"), ProviderError::Transient { .. }));

        let parse = DataError::parse("ff5.csv", "no header");
        match parse.into_provider("ff5") {
            ProviderError::Malformed { key, reason } => {
                assert_eq!(key, "ff5");
                assert!(reason.contains("no header"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
