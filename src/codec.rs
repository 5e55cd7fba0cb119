//! Protobuf encoding of aggregated metric samples
//!
//! Each stored cell holds one `Metric` message whose `value` oneof carries
//! the bucket statistics. Only the numeric variant is recognized; a cell
//! holding anything else, or bytes that are not a `Metric`, decodes to a
//! [`CodecError`] so callers can skip it.
//!
//! ```protobuf
//! message Metric {
//!   oneof value {
//!     NumericValue numericValue = 1;
//!   }
//! }
//!
//! message NumericValue {
//!   double min = 1;
//!   double max = 2;
//!   double sum = 3;
//!   uint64 cnt = 4;
//!   double stddev = 5;
//!   string minKey = 6;
//!   string maxKey = 7;
//! }
//! ```

use prost::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding a stored record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed metric record: {0}")]
    Malformed(#[from] prost::DecodeError),

    #[error("metric record holds no numeric value")]
    MissingValue,
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// The statistics of one aggregated bucket
#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
pub struct NumericValue {
    #[prost(double, tag = "1")]
    pub min: f64,
    #[prost(double, tag = "2")]
    pub max: f64,
    #[prost(double, tag = "3")]
    pub sum: f64,
    /// Number of raw samples folded into the bucket
    #[prost(uint64, tag = "4")]
    #[serde(rename = "cnt")]
    pub count: u64,
    #[prost(double, tag = "5")]
    pub stddev: f64,
    /// Identifier of the sample holding the minimum
    #[prost(string, tag = "6")]
    #[serde(rename = "minKey")]
    pub min_key: String,
    /// Identifier of the sample holding the maximum
    #[prost(string, tag = "7")]
    #[serde(rename = "maxKey")]
    pub max_key: String,
}

/// Envelope stored in every cell
#[derive(Clone, PartialEq, Message)]
struct Metric {
    #[prost(oneof = "MetricValue", tags = "1")]
    value: Option<MetricValue>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
enum MetricValue {
    #[prost(message, tag = "1")]
    NumericValue(NumericValue),
}

/// One decoded cell: the column key it was stored under plus its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Column key of the cell within its shard row
    #[serde(rename = "name")]
    pub bucket_key: String,
    pub value: NumericValue,
}

impl MetricSample {
    /// Decode a stored cell
    pub fn from_cell(column: impl Into<String>, blob: &[u8]) -> CodecResult<Self> {
        Ok(Self {
            bucket_key: column.into(),
            value: decode(blob)?,
        })
    }
}

/// Encode a numeric value into its stored form
pub fn encode(value: &NumericValue) -> Vec<u8> {
    Metric {
        value: Some(MetricValue::NumericValue(value.clone())),
    }
    .encode_to_vec()
}

/// Decode a stored record
pub fn decode(blob: &[u8]) -> CodecResult<NumericValue> {
    match Metric::decode(blob)?.value {
        Some(MetricValue::NumericValue(value)) => Ok(value),
        None => Err(CodecError::MissingValue),
    }
}
