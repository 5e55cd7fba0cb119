//! Time-based shard planning for metric rows
//!
//! Stored buckets are partitioned into rows by a calendar unit that depends
//! on the aggregation period. This module maps periods to those units and
//! enumerates the rows a time-range query has to read.

mod key;
mod period;
mod planner;

pub use key::{validate_identifier, SeriesKey, ShardId, TableRef};
pub use period::{AlignmentRule, Period};
pub use planner::{ShardPlan, ShardPlanner, TimeRange};

/// Separator between the metric key and the shard label in a row key
pub const ROW_KEY_SEPARATOR: char = '.';
