//! Error handling for gator_query
//!
//! This module provides error types and result aliases for query operations.
//! Validation errors are raised before any storage I/O and are reported to
//! callers as client errors. Shard and aggregate failures are server errors.

use std::io;
use thiserror::Error;

use crate::codec::CodecError;
use crate::shard::Period;
use crate::store::StoreError;

/// Errors that can occur in query operations
#[derive(Error, Debug)]
pub enum Error {
    /// A customer, project or metric identifier failed validation
    #[error("Invalid {field}: {value:?}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
    },

    /// The requested period is not one of the known periods
    #[error("Invalid period: {0:?}")]
    InvalidPeriod(String),

    /// The period is known but has no shard alignment rule
    #[error("Unsupported period: {0}")]
    UnsupportedPeriod(Period),

    /// The time range is malformed or unrepresentable
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A stored cell could not be decoded
    #[error("Corrupt record: {0}")]
    CorruptRecord(#[from] CodecError),

    /// A single shard read failed
    #[error("Shard {row_key} unavailable: {source}")]
    ShardUnavailable {
        row_key: String,
        #[source]
        source: StoreError,
    },

    /// At least one shard of a multi-shard query failed
    #[error("Query over {shards} shards failed: {source}")]
    AggregateFetchFailed {
        shards: usize,
        #[source]
        source: Box<Error>,
    },

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid identifier error
    pub fn invalid_identifier(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field,
            value: value.into(),
        }
    }

    /// Create a new invalid period error
    pub fn invalid_period(period: impl Into<String>) -> Self {
        Self::InvalidPeriod(period.into())
    }

    /// Create a new invalid range error
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange(message.into())
    }

    /// Create a new shard unavailable error
    pub fn shard_unavailable(row_key: impl Into<String>, source: StoreError) -> Self {
        Self::ShardUnavailable {
            row_key: row_key.into(),
            source,
        }
    }

    /// Wrap the first shard failure of a multi-shard query
    pub fn aggregate(shards: usize, source: Error) -> Self {
        Self::AggregateFetchFailed {
            shards,
            source: Box::new(source),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error was caused by the request rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::InvalidPeriod(_)
                | Self::UnsupportedPeriod(_)
                | Self::InvalidRange(_)
        )
    }

    /// Check if this is a corrupt record error
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, Self::CorruptRecord(_))
    }

    /// Check if this error came from a storage read
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::ShardUnavailable { .. } | Self::AggregateFetchFailed { .. })
    }

    /// Get the row key of the shard that failed, if any
    pub fn failed_row_key(&self) -> Option<&str> {
        match self {
            Self::ShardUnavailable { row_key, .. } => Some(row_key),
            Self::AggregateFetchFailed { source, .. } => source.failed_row_key(),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidIdentifier { .. } => {
                Some("Customer and project names may only contain ASCII letters and digits".to_string())
            }
            Self::InvalidPeriod(_) => {
                Some("Use one of 1s, 5s, 15s, 1min, 5min, 15min, 1h, 12h, 1d, 1w, 1mo, 3mo, 1y".to_string())
            }
            Self::UnsupportedPeriod(_) => {
                Some("Sub-15s periods are not sharded yet; query with 15s or coarser".to_string())
            }
            Self::InvalidRange(_) => {
                Some("Pass `from` and `to` as integer unix seconds with from <= to".to_string())
            }
            Self::ShardUnavailable { .. } | Self::AggregateFetchFailed { .. } => {
                Some("Check connectivity to the column store".to_string())
            }
            _ => None,
        }
    }
}
