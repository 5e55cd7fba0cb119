//! Single-shard reads
//!
//! A fetch issues exactly one row read and decodes every returned cell.
//! Corrupt cells are logged and dropped; a failed read fails the fetch.

use std::sync::Arc;
use std::time::Instant;

use tracing::{trace, warn};

use crate::codec::MetricSample;
use crate::error::{Error, Result};
use crate::metrics::QueryMetrics;
use crate::shard::{SeriesKey, TableRef};
use crate::store::{ColumnRange, ColumnStore};

/// Reads and decodes one shard row at a time
#[derive(Clone)]
pub struct ShardFetcher {
    store: Arc<dyn ColumnStore>,
    metrics: Arc<QueryMetrics>,
}

impl ShardFetcher {
    /// Create a new fetcher over a store
    pub fn new(store: Arc<dyn ColumnStore>, metrics: Arc<QueryMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Read one row and decode its cells in column order
    ///
    /// Safe to retry; the read has no side effects.
    pub async fn fetch(&self, table: &TableRef, row_key: &str, range: &ColumnRange) -> Result<Vec<MetricSample>> {
        let start = Instant::now();
        let read = self.store.read_row(table, row_key, range).await;
        self.metrics.record_fetch(start.elapsed(), read.is_ok());

        let cells = read.map_err(|e| Error::shard_unavailable(row_key, e))?;

        let mut samples = Vec::with_capacity(cells.len());
        let mut skipped = 0;

        for cell in cells {
            match MetricSample::from_cell(cell.column, &cell.value) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    skipped += 1;
                    warn!(%table, row_key, error = %e, "skipping undecodable cell");
                }
            }
        }

        self.metrics.add_records(samples.len(), skipped);
        trace!(%table, row_key, decoded = samples.len(), skipped, "shard fetched");

        Ok(samples)
    }

    /// Read the shard of a series with the given label
    pub async fn fetch_shard(
        &self,
        table: &TableRef,
        series: &SeriesKey,
        label: impl std::fmt::Display,
        range: &ColumnRange,
    ) -> Result<Vec<MetricSample>> {
        let row_key = series.shard(label).row_key();
        self.fetch(table, &row_key, range).await
    }
}
