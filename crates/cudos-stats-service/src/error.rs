//! Error types for the stats service

use cudos_stats_economics::EconomicsError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while refreshing or serving metrics
#[derive(Error, Debug)]
pub enum StatsError {
    // === Startup ===
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured value is out of range or malformed
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Decimal or curve error from the economic model
    #[error(transparent)]
    Economics(#[from] EconomicsError),

    // === Collaborators ===
    /// Transport-level failure talking to a node or REST endpoint
    #[error("HTTP error: {0}")]
    Http(String),

    /// A round trip did not complete in time
    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    /// Response could not be interpreted
    #[error("Malformed response from {source_name}: {reason}")]
    MalformedResponse { source_name: &'static str, reason: String },

    // === Domain ===
    /// Mint denomination missing from a supply or balance listing
    #[error("Denomination {denom} not found in {context}")]
    DenomNotFound { denom: String, context: String },

    /// Bounded height scan ran out of attempts
    #[error("no {what} found within {blocks} blocks of height {height}")]
    ScanExhausted { what: &'static str, blocks: u64, height: i64 },

    /// Subtracting non-circulating balances went below zero
    #[error("Negative circulating supply: {0}")]
    NegativeSupply(String),

    // === Cache ===
    /// Key has not been written yet
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Cached text could not be decoded
    #[error("Invalid cached value for {key}: {value}")]
    InvalidCachedValue { key: String, value: String },

    // === Plumbing ===
    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Prometheus registry error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Socket or file error
    #[error("IO error: {0}")]
    Io(String),

    /// Blocking computation panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl StatsError {
    /// Whether the error came from the read side of the cache
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, StatsError::NotFound(_))
    }
}

impl From<reqwest::Error> for StatsError {
    fn from(err: reqwest::Error) -> Self {
        StatsError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        StatsError::Serialization(err.to_string())
    }
}

impl From<::config::ConfigError> for StatsError {
    fn from(err: ::config::ConfigError) -> Self {
        StatsError::Config(err.to_string())
    }
}

impl From<prometheus::Error> for StatsError {
    fn from(err: prometheus::Error) -> Self {
        StatsError::Metrics(err.to_string())
    }
}

impl From<std::io::Error> for StatsError {
    fn from(err: std::io::Error) -> Self {
        StatsError::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StatsError {
    fn from(err: tokio::task::JoinError) -> Self {
        StatsError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_exhausted_message() {
        let err = StatsError::ScanExhausted {
            what: "non-empty supply",
            blocks: 100,
            height: 42,
        };
        assert_eq!(err.to_string(), "no non-empty supply found within 100 blocks of height 42");
    }

    #[test]
    fn test_economics_error_is_transparent() {
        let err: StatsError = EconomicsError::DivisionByZero("bonded tokens").into();
        assert_eq!(err.to_string(), "Division by zero: bonded tokens");
        assert!(!err.is_cache_miss());
        assert!(StatsError::NotFound("apr".into()).is_cache_miss());
    }
}
