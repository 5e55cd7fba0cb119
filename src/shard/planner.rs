//! Shard planning for time-range queries
//!
//! Maps a period and a `[from, to)` range onto the ordered list of shard
//! labels whose rows may hold buckets in that range. The enumeration is
//! inclusive at both ends, so a bucket straddling the last boundary is still
//! read.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::shard::{AlignmentRule, Period, ShardId};
use crate::store::ColumnRange;

/// A `[from, to)` range of unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Start (inclusive)
    pub from: i64,
    /// End (exclusive)
    pub to: i64,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(from: i64, to: i64) -> Result<Self> {
        if from > to {
            return Err(Error::invalid_range(format!(
                "from ({}) is after to ({})",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Parse a range from its query-string form
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let from = parse_seconds("from", from)?;
        let to = parse_seconds("to", to)?;
        Self::new(from, to)
    }

    /// Column keys covered by this range
    pub fn columns(&self) -> ColumnRange {
        ColumnRange::new(self.from.to_string(), self.to.to_string())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| Error::invalid_range(format!("{} is not an integer: {:?}", name, value)))
}

/// The shards a query must read, in read order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardPlan {
    /// Requested period
    pub period: Period,
    /// Rule the labels were derived with
    pub rule: AlignmentRule,
    /// Shard labels, ascending
    pub labels: Vec<i64>,
}

impl ShardPlan {
    /// Number of shards in the plan
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the plan reads no shard
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Shard ids for a metric, in plan order
    pub fn shard_ids<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = ShardId> + 'a {
        self.labels.iter().map(move |label| ShardId::new(metric, *label))
    }

    /// Row keys for a metric, in plan order
    pub fn row_keys(&self, metric: &str) -> Vec<String> {
        self.shard_ids(metric).map(|id| id.row_key()).collect()
    }
}

/// Computes shard plans. Performs no I/O.
///
/// A planner may carry a cap on the number of shards one plan can hold; a
/// range needing more is rejected before any label is materialized.
#[derive(Debug, Clone, Copy)]
pub struct ShardPlanner {
    max_shards: usize,
}

impl Default for ShardPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardPlanner {
    /// Create a new planner with no shard cap
    pub fn new() -> Self {
        Self { max_shards: usize::MAX }
    }

    /// Set the maximum number of shards a single plan may hold
    pub fn with_max_shards(mut self, max: usize) -> Self {
        self.max_shards = max;
        self
    }

    /// Maximum number of shards a single plan may hold
    pub fn max_shards(&self) -> usize {
        self.max_shards
    }

    /// Plan the shards covering `[from, to)` for a period
    pub fn plan(&self, period: Period, from: i64, to: i64) -> Result<ShardPlan> {
        let rule = period.alignment()?;
        let first = rule.project(from)?;
        let last = rule.project(to)?;
        let step = rule.step();

        let count = label_count(first, last, step);
        if count > self.max_shards {
            return Err(Error::invalid_range(format!(
                "range needs {} {} shards, at most {} allowed",
                count, period, self.max_shards
            )));
        }

        Ok(ShardPlan {
            period,
            rule,
            labels: fill(first, last, step),
        })
    }

    /// Plan from unparsed period and range strings
    ///
    /// The range is checked before the period, so a request with both a bad
    /// range and a bad period reports the range.
    pub fn plan_str(&self, period: &str, from: &str, to: &str) -> Result<(ShardPlan, TimeRange)> {
        let range = TimeRange::parse(from, to)?;
        let period: Period = period.parse()?;
        let plan = self.plan(period, range.from, range.to)?;
        Ok((plan, range))
    }
}

/// Number of labels `fill` yields for the same arguments
fn label_count(first: i64, last: i64, step: i64) -> usize {
    if first > last {
        return 0;
    }
    ((last - first) / step) as usize + 1
}

/// Every label from `first` to `last` inclusive, `step` apart
fn fill(first: i64, last: i64, step: i64) -> Vec<i64> {
    if first > last {
        return Vec::new();
    }
    (first..=last).step_by(step as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp()
    }

    #[test]
    fn test_month_period_in_june_2015() {
        let plan = ShardPlanner::new()
            .plan(Period::OneMonth, 1433116000, 1434000000)
            .unwrap();

        assert_eq!(plan.rule, AlignmentRule::Decade);
        assert_eq!(plan.labels, vec![2010]);
        assert_eq!(plan.row_keys("snr.phl"), vec!["snr.phl.2010".to_string()]);
    }

    #[test]
    fn test_twelve_hours_across_new_year() {
        let plan = ShardPlanner::new()
            .plan(Period::TwelveHours, ts(2015, 11, 3), ts(2016, 2, 1))
            .unwrap();

        assert_eq!(plan.rule, AlignmentRule::Year);
        assert_eq!(plan.labels, vec![2015, 2016]);
    }

    #[test]
    fn test_one_year_single_millennium() {
        let plan = ShardPlanner::new()
            .plan(Period::OneYear, ts(1999, 1, 1), ts(2015, 1, 1))
            .unwrap();
        assert_eq!(plan.labels, vec![1000, 2000]);
    }

    #[test]
    fn test_hour_quarters() {
        let plan = ShardPlanner::new()
            .plan(Period::OneHour, ts(2015, 2, 10), ts(2015, 8, 1))
            .unwrap();
        assert_eq!(
            plan.labels,
            vec![2015 * 12, 2015 * 12 + 3, 2015 * 12 + 6]
        );
    }

    #[test]
    fn test_month_rolls_over_year() {
        let plan = ShardPlanner::new()
            .plan(Period::FiveMinutes, ts(2014, 11, 15), ts(2015, 1, 2))
            .unwrap();
        assert_eq!(
            plan.labels,
            vec![2014 * 12 + 10, 2014 * 12 + 11, 2015 * 12]
        );
    }

    #[test]
    fn test_day_boundary_is_inclusive() {
        // `to` at midnight still reads that day's shard
        let plan = ShardPlanner::new()
            .plan(Period::OneMinute, ts(2015, 6, 1) + 3600, ts(2015, 6, 3))
            .unwrap();
        assert_eq!(
            plan.labels,
            vec![ts(2015, 6, 1), ts(2015, 6, 2), ts(2015, 6, 3)]
        );
    }

    #[test]
    fn test_shard_cap_boundary() {
        let (from, to) = (ts(2015, 6, 1) + 3600, ts(2015, 6, 3));

        let plan = ShardPlanner::new()
            .with_max_shards(3)
            .plan(Period::OneMinute, from, to)
            .unwrap();
        assert_eq!(plan.len(), 3);

        let err = ShardPlanner::new()
            .with_max_shards(2)
            .plan(Period::OneMinute, from, to)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_shard_cap_rejects_huge_range_up_front() {
        // Millions of day shards; refused without building the label list
        let planner = ShardPlanner::new().with_max_shards(1000);
        let err = planner.plan(Period::OneMinute, 0, 253402300799).unwrap_err();
        assert!(matches!(err, Error::InvalidRange(_)));

        let err = planner
            .plan_str("15min", "-8000000000000", "8000000000000")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange(_)));
    }

    #[test]
    fn test_unsupported_periods() {
        for period in [Period::FiveSeconds, Period::OneSecond] {
            let err = ShardPlanner::new().plan(period, 0, 60).unwrap_err();
            assert!(matches!(err, Error::UnsupportedPeriod(p) if p == period));
        }
    }

    #[test]
    fn test_plan_str_validation_order() {
        let planner = ShardPlanner::new();

        assert!(matches!(planner.plan_str("7d", "0", "10"), Err(Error::InvalidPeriod(_))));
        assert!(matches!(planner.plan_str("7d", "abc", "10"), Err(Error::InvalidRange(_))));
        assert!(matches!(planner.plan_str("1d", "10", "1.5"), Err(Error::InvalidRange(_))));
        assert!(matches!(planner.plan_str("1d", "10", "5"), Err(Error::InvalidRange(_))));
        assert!(matches!(planner.plan_str("1s", "0", "5"), Err(Error::UnsupportedPeriod(_))));

        let (plan, range) = planner.plan_str("1mo", "1433116000", "1434000000").unwrap();
        assert_eq!(plan.labels, vec![2010]);
        assert_eq!(range, TimeRange { from: 1433116000, to: 1434000000 });
    }

    #[test]
    fn test_time_range_columns() {
        let range = TimeRange::new(1433116000, 1434000000).unwrap();
        let columns = range.columns();
        assert_eq!(columns.start(), "1433116000");
        assert_eq!(columns.end(), "1434000000");
        assert_eq!(range.to_string(), "[1433116000, 1434000000)");
    }

    fn supported_period() -> impl Strategy<Value = Period> {
        prop::sample::select(
            Period::all()
                .into_iter()
                .filter(|p| p.is_supported())
                .collect::<Vec<_>>(),
        )
    }

    proptest! {
        #[test]
        fn prop_plan_covers_range(
            period in supported_period(),
            from in -2_000_000_000i64..4_000_000_000i64,
            span in 0i64..400_000_000i64,
        ) {
            let to = from + span;
            let plan = ShardPlanner::new().plan(period, from, to).unwrap();
            let rule = plan.rule;

            prop_assert!(!plan.is_empty());
            prop_assert_eq!(
                plan.len(),
                label_count(plan.labels[0], *plan.labels.last().unwrap(), rule.step())
            );
            prop_assert_eq!(plan.labels[0], rule.project(from).unwrap());
            prop_assert_eq!(*plan.labels.last().unwrap(), rule.project(to).unwrap());
            for pair in plan.labels.windows(2) {
                prop_assert_eq!(pair[1] - pair[0], rule.step());
            }
        }
    }
}
