//! Query orchestration
//!
//! A time-series query is validated, planned into shard reads, fanned out
//! with bounded concurrency and merged back in plan order. Any failed shard
//! fails the whole query; callers never see a partial series.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::codec::MetricSample;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::fetch::ShardFetcher;
use crate::metrics::QueryMetrics;
use crate::shard::{SeriesKey, ShardPlan, ShardPlanner, TableRef, TimeRange};
use crate::store::{ColumnRange, ColumnStore};

/// Runs snapshot and time-series queries against a column store
#[derive(Clone)]
pub struct QueryOrchestrator {
    fetcher: ShardFetcher,
    planner: ShardPlanner,
    config: Arc<ServiceConfig>,
    metrics: Arc<QueryMetrics>,
}

impl QueryOrchestrator {
    /// Create a new orchestrator over a store
    pub fn new(store: Arc<dyn ColumnStore>, config: ServiceConfig) -> Self {
        let metrics = Arc::new(QueryMetrics::with_enabled(config.collect_metrics));
        Self {
            fetcher: ShardFetcher::new(store, metrics.clone()),
            planner: ShardPlanner::new().with_max_shards(config.max_shards_per_query),
            config: Arc::new(config),
            metrics,
        }
    }

    /// Get the service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get the query metrics
    pub fn metrics(&self) -> &Arc<QueryMetrics> {
        &self.metrics
    }

    /// Table holding a series under the configured layout
    pub fn table_for(&self, series: &SeriesKey) -> TableRef {
        series.table(&self.config.keyspace, &self.config.table_suffix)
    }

    /// Run a time-series query from its request parameters
    ///
    /// Identifiers, the range, the period and the shard count are all
    /// checked before any storage read is issued.
    pub async fn run(&self, series: &SeriesKey, period: &str, from: &str, to: &str) -> Result<Vec<MetricSample>> {
        let request_id = Uuid::new_v4();
        let span = info_span!("timeseries", %request_id, %series, period, from, to);

        async move {
            let (plan, range) = match series
                .validate()
                .and_then(|_| self.planner.plan_str(period, from, to))
            {
                Ok(planned) => planned,
                Err(e) => {
                    self.metrics.increment_rejected();
                    debug!(error = %e, "rejected query");
                    return Err(e);
                }
            };

            self.run_plan(series, &plan, &range).await
        }
        .instrument(span)
        .await
    }

    /// Fetch every shard of a plan and concatenate the results
    ///
    /// `series` must already be validated.
    pub async fn run_plan(&self, series: &SeriesKey, plan: &ShardPlan, range: &TimeRange) -> Result<Vec<MetricSample>> {
        let start = Instant::now();
        self.metrics.increment_queries();

        let table = self.table_for(series);
        let columns = range.columns();
        let row_keys = plan.row_keys(&series.metric);
        debug!(%table, rule = %plan.rule, shards = row_keys.len(), "planned query");

        let result = self.fetch_all(&table, &row_keys, &columns).await;
        self.metrics.record_query_duration(start.elapsed());

        match result {
            Ok(samples) => Ok(samples),
            Err(e) => {
                self.metrics.increment_failed();
                error!(%table, error = %e, "query failed");
                Err(Error::aggregate(row_keys.len(), e))
            }
        }
    }

    /// Read every cell of a single row
    pub async fn snapshot(&self, series: &SeriesKey, timestamp: &str) -> Result<Vec<MetricSample>> {
        let request_id = Uuid::new_v4();
        let span = info_span!("snapshot", %request_id, %series, timestamp);

        async move {
            if let Err(e) = series.validate() {
                self.metrics.increment_rejected();
                debug!(error = %e, "rejected snapshot");
                return Err(e);
            }
            self.metrics.increment_snapshots();

            let table = self.table_for(series);

            self.fetcher
                .fetch_shard(&table, series, timestamp, &ColumnRange::full_row())
                .await
                .map_err(|e| {
                    self.metrics.increment_failed();
                    error!(%table, error = %e, "snapshot failed");
                    e
                })
        }
        .instrument(span)
        .await
    }

    /// Fetch rows concurrently and merge them in the order given
    ///
    /// Returns on the first failure to complete, dropping the reads still
    /// in flight.
    async fn fetch_all(&self, table: &TableRef, row_keys: &[String], columns: &ColumnRange) -> Result<Vec<MetricSample>> {
        let mut slots: Vec<Option<Vec<MetricSample>>> = vec![None; row_keys.len()];

        // Each read owns its inputs so the stream borrows nothing from the
        // caller's frame
        let mut reads = stream::iter(row_keys.to_vec().into_iter().enumerate())
            .map(|(index, row_key)| {
                let fetcher = self.fetcher.clone();
                let table = table.clone();
                let columns = columns.clone();
                async move { (index, fetcher.fetch(&table, &row_key, &columns).await) }
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1));

        while let Some((index, result)) = reads.next().await {
            slots[index] = Some(result?);
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }
}
