//! # gator_query
//!
//! Time-range queries over pre-aggregated metrics held in a column store.
//!
//! Buckets of each aggregation period are stored in rows partitioned by a
//! calendar unit (decade, year, quarter, month or day, depending on the
//! period). A query is planned into the set of rows covering its range, the
//! rows are read concurrently and the decoded buckets are concatenated in
//! row order.
//!
//! ```no_run
//! use std::sync::Arc;
//! use gator_query::{MemoryStore, QueryOrchestrator, SeriesKey, ServiceConfig};
//!
//! # async fn example() -> gator_query::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let query = QueryOrchestrator::new(store, ServiceConfig::new());
//!
//! let series = SeriesKey::new("acme", "web", "latency");
//! let samples = query.run(&series, "1mo", "1433116000", "1434000000").await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod query;
pub mod shard;
pub mod store;

#[cfg(feature = "server")]
pub mod http;

pub use codec::{MetricSample, NumericValue};
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use fetch::ShardFetcher;
pub use metrics::QueryMetrics;
pub use query::QueryOrchestrator;
pub use shard::{AlignmentRule, Period, SeriesKey, ShardPlan, ShardPlanner, TimeRange};
pub use store::{ColumnRange, ColumnStore, MemoryStore, StoreError};
