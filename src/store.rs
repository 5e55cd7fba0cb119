//! Column store interface
//!
//! The query path only needs one operation from the store: read a column
//! range of a single row. [`ColumnStore`] captures that, so the real cluster
//! client and [`MemoryStore`] are interchangeable and the query path can be
//! tested without a cluster.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, NumericValue};
use crate::error::{Error, Result};
use crate::shard::TableRef;

/// Lowest column key sentinel, sorts before every stored column key
pub const COLUMN_MIN: &str = "!";
/// Highest column key sentinel, sorts after every stored column key
pub const COLUMN_MAX: &str = "~";

/// Errors reported by a column store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the read failed in transit
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The table does not exist
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The read did not finish in time
    #[error("read timed out: {0}")]
    Timeout(String),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a new unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new table not found error
    pub fn table_not_found(table: &TableRef) -> Self {
        Self::TableNotFound(table.to_string())
    }
}

/// A `[start, end)` range of column keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRange {
    start: String,
    end: String,
}

impl ColumnRange {
    /// Create a new column range
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// The range spanning every column of a row
    pub fn full_row() -> Self {
        Self::new(COLUMN_MIN, COLUMN_MAX)
    }

    /// First column key (inclusive)
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Last column key (exclusive)
    pub fn end(&self) -> &str {
        &self.end
    }
}

/// One stored cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column key
    pub column: String,
    /// Encoded payload
    pub value: Vec<u8>,
}

impl Cell {
    /// Create a new cell
    pub fn new(column: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Read access to a column store
#[async_trait]
pub trait ColumnStore: Send + Sync {
    /// Read the cells of one row whose column key is in `range`, in column order
    async fn read_row(&self, table: &TableRef, row_key: &str, range: &ColumnRange) -> StoreResult<Vec<Cell>>;
}

type Row = BTreeMap<String, Vec<u8>>;

/// In-memory column store
///
/// Rows are kept in column-key order, which matches the clustering order the
/// query path expects from the real store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<TableRef, HashMap<String, Row>>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table if it does not exist yet
    pub fn create_table(&self, table: &TableRef) {
        self.tables.write().entry(table.clone()).or_default();
    }

    /// Store raw bytes in a cell, creating the table and row if needed
    pub fn insert(&self, table: &TableRef, row_key: &str, column: &str, value: Vec<u8>) {
        self.tables
            .write()
            .entry(table.clone())
            .or_default()
            .entry(row_key.to_string())
            .or_default()
            .insert(column.to_string(), value);
    }

    /// Encode and store a numeric value
    pub fn insert_value(&self, table: &TableRef, row_key: &str, column: &str, value: &NumericValue) {
        self.insert(table, row_key, column, codec::encode(value));
    }

    /// Number of rows across all tables
    pub fn row_count(&self) -> usize {
        self.tables.read().values().map(|rows| rows.len()).sum()
    }

    /// Number of `read_row` calls served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Load cells from a JSON fixture file
    ///
    /// The file holds an array of [`FixtureCell`]s.
    pub fn load_fixture<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        let cells: Vec<FixtureCell> = serde_json::from_str(&content)?;

        for cell in &cells {
            let (keyspace, name) = cell
                .table
                .split_once('.')
                .ok_or_else(|| Error::config(format!("Fixture table must be keyspace.name: {}", cell.table)))?;
            let table = TableRef::new(keyspace, name);
            self.insert_value(&table, &cell.row, &cell.column, &cell.value);
        }

        Ok(cells.len())
    }
}

#[async_trait]
impl ColumnStore for MemoryStore {
    async fn read_row(&self, table: &TableRef, row_key: &str, range: &ColumnRange) -> StoreResult<Vec<Cell>> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        let row = match rows.get(row_key) {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        // BTreeMap::range panics on an inverted range
        if range.start() >= range.end() {
            return Ok(Vec::new());
        }

        let cells = row
            .range::<str, _>((Bound::Included(range.start()), Bound::Excluded(range.end())))
            .map(|(column, value)| Cell::new(column.clone(), value.clone()))
            .collect();

        Ok(cells)
    }
}

/// One cell of a fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCell {
    /// `keyspace.table`
    pub table: String,
    pub row: String,
    pub column: String,
    pub value: NumericValue,
}
