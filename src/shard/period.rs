//! Aggregation periods and their shard alignment rules
//!
//! Every aggregation period stores its buckets in rows partitioned by a
//! calendar unit. Coarser periods use wider partitions so that a single row
//! holds a reasonable number of buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Aggregation period of a stored series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1s")]
    OneSecond,
    #[serde(rename = "5s")]
    FiveSeconds,
    #[serde(rename = "15s")]
    FifteenSeconds,
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::invalid_period(s))
    }
}

impl Period {
    /// Get the wire name of the period
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneSecond => "1s",
            Self::FiveSeconds => "5s",
            Self::FifteenSeconds => "15s",
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::OneHour => "1h",
            Self::TwelveHours => "12h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::OneYear => "1y",
        }
    }

    /// Get the shard alignment rule for this period
    ///
    /// Fails with [`Error::UnsupportedPeriod`] for periods whose rows have
    /// no partitioning scheme yet.
    pub fn alignment(&self) -> Result<AlignmentRule> {
        match self {
            Self::OneYear => Ok(AlignmentRule::Millennium),
            Self::ThreeMonths | Self::OneMonth | Self::OneWeek | Self::OneDay => {
                Ok(AlignmentRule::Decade)
            }
            Self::TwelveHours => Ok(AlignmentRule::Year),
            Self::OneHour => Ok(AlignmentRule::QuarterMonth),
            Self::FifteenMinutes | Self::FiveMinutes => Ok(AlignmentRule::Month),
            Self::OneMinute | Self::FifteenSeconds => Ok(AlignmentRule::Day),
            // TODO: hour-aligned shards once 5s/1s rows are written
            Self::FiveSeconds | Self::OneSecond => Err(Error::UnsupportedPeriod(*self)),
        }
    }

    /// Check whether the period has an alignment rule
    pub fn is_supported(&self) -> bool {
        self.alignment().is_ok()
    }

    /// Get all periods, finest first
    pub fn all() -> [Self; 13] {
        [
            Self::OneSecond,
            Self::FiveSeconds,
            Self::FifteenSeconds,
            Self::OneMinute,
            Self::FiveMinutes,
            Self::FifteenMinutes,
            Self::OneHour,
            Self::TwelveHours,
            Self::OneDay,
            Self::OneWeek,
            Self::OneMonth,
            Self::ThreeMonths,
            Self::OneYear,
        ]
    }
}

/// How shard labels are derived from timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentRule {
    /// Year rounded down to the millennium (2000, 3000, ...)
    Millennium,
    /// Year rounded down to the decade (2010, 2020, ...)
    Decade,
    /// Calendar year (2014, 2015, ...)
    Year,
    /// Month index of the quarter start (`year * 12 + quarter * 3`)
    QuarterMonth,
    /// Month index (`year * 12 + month`, months counted from 0)
    Month,
    /// Epoch seconds of the UTC midnight starting the day
    Day,
}

impl fmt::Display for AlignmentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millennium => write!(f, "millennium"),
            Self::Decade => write!(f, "decade"),
            Self::Year => write!(f, "year"),
            Self::QuarterMonth => write!(f, "quarter_month"),
            Self::Month => write!(f, "month"),
            Self::Day => write!(f, "day"),
        }
    }
}

impl AlignmentRule {
    /// Distance between consecutive labels
    pub fn step(&self) -> i64 {
        match self {
            Self::Millennium => 1000,
            Self::Decade => 10,
            Self::Year => 1,
            Self::QuarterMonth => 3,
            Self::Month => 1,
            Self::Day => SECONDS_PER_DAY,
        }
    }

    /// Project a timestamp onto the label of the shard containing it
    pub fn label(&self, timestamp: &DateTime<Utc>) -> i64 {
        let year = i64::from(timestamp.year());
        let month = i64::from(timestamp.month0());

        match self {
            Self::Millennium => year.div_euclid(1000) * 1000,
            Self::Decade => year.div_euclid(10) * 10,
            Self::Year => year,
            Self::QuarterMonth => year * 12 + (month / 3) * 3,
            Self::Month => year * 12 + month,
            Self::Day => timestamp.timestamp().div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY,
        }
    }

    /// Project unix seconds onto a shard label
    pub fn project(&self, unix_seconds: i64) -> Result<i64> {
        let timestamp = Utc
            .timestamp_opt(unix_seconds, 0)
            .single()
            .ok_or_else(|| Error::invalid_range(format!("timestamp {} is out of range", unix_seconds)))?;
        Ok(self.label(&timestamp))
    }
}
