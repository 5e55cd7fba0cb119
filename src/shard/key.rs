//! Series, table and row identifiers
//!
//! Table names and row keys are assembled by string concatenation, so the
//! parts that end up in a table name are restricted to ASCII alphanumerics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::shard::ROW_KEY_SEPARATOR;

/// Identifies one stored metric series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub customer: String,
    pub project: String,
    /// Metric name, the row key prefix
    pub metric: String,
}

impl SeriesKey {
    /// Create a new series key without validating it
    pub fn new(
        customer: impl Into<String>,
        project: impl Into<String>,
        metric: impl Into<String>,
    ) -> Self {
        Self {
            customer: customer.into(),
            project: project.into(),
            metric: metric.into(),
        }
    }

    /// Check every component before it is used to build a table or row name
    pub fn validate(&self) -> Result<()> {
        validate_identifier("customer", &self.customer)?;
        validate_identifier("project", &self.project)?;
        if self.metric.is_empty() {
            return Err(Error::invalid_identifier("metric", ""));
        }
        Ok(())
    }

    /// Shard id of this series for a label
    pub fn shard(&self, label: impl fmt::Display) -> ShardId {
        ShardId::new(&self.metric, label)
    }

    /// Table holding this series
    pub fn table(&self, keyspace: &str, suffix: &str) -> TableRef {
        TableRef {
            keyspace: keyspace.to_string(),
            name: format!("{}_{}{}", self.customer, self.project, suffix),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.customer, self.project, self.metric)
    }
}

/// Check that a value is a non-empty run of ASCII letters and digits
pub fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(Error::invalid_identifier(field, value))
    }
}

/// A fully qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub keyspace: String,
    pub name: String,
}

impl TableRef {
    /// Create a new table reference
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.name)
    }
}

/// A metric key paired with a shard label; names one stored row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardId {
    pub metric: String,
    pub label: String,
}

impl ShardId {
    /// Create a new shard id
    pub fn new(metric: impl Into<String>, label: impl fmt::Display) -> Self {
        Self {
            metric: metric.into(),
            label: label.to_string(),
        }
    }

    /// Row key of the shard: `{metric}.{label}`
    pub fn row_key(&self) -> String {
        format!("{}{}{}", self.metric, ROW_KEY_SEPARATOR, self.label)
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.metric, ROW_KEY_SEPARATOR, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("customer", "acme").is_ok());
        assert!(validate_identifier("customer", "ACME42").is_ok());

        for bad in ["", "ac me", "acme;drop", "ac_me", "ac-me", "acmé", "a.b"] {
            let err = validate_identifier("customer", bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidIdentifier { field: "customer", ref value } if value == bad),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_series_validation() {
        assert!(SeriesKey::new("pldt", "snr", "phl.1d").validate().is_ok());

        let err = SeriesKey::new("pldt", "sn r", "phl").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { field: "project", .. }));

        let err = SeriesKey::new("pldt", "snr", "").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { field: "metric", .. }));
    }

    #[test]
    fn test_table_and_row_names() {
        let series = SeriesKey::new("pldt", "snr", "phl.1d");

        let table = series.table("data", "_metrics");
        assert_eq!(table.to_string(), "data.pldt_snr_metrics");

        let shard = series.shard(2010);
        assert_eq!(shard.row_key(), "phl.1d.2010");
        assert_eq!(shard.to_string(), shard.row_key());
    }
}
