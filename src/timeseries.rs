//! Year bucketing for the timeseries panel.
//!
//! Records carry a start year, an end year, both, or neither, and the mix
//! varies between filters. [`bucket`] classifies the mix, picks one
//! representative year per record (start year first), averages the metric per
//! year, and tells the caller whether the result reads better as a sparse bar
//! chart or as a continuous line.

use crate::models::{Metric, Record, TimeseriesPoint};
use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Share of end-year-only records (among records with any year) above which
/// the series is presented as bars.
pub const END_YEAR_ONLY_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketConfig {
    /// See [`END_YEAR_ONLY_THRESHOLD`].
    pub end_only_threshold: f64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            end_only_threshold: END_YEAR_ONLY_THRESHOLD,
        }
    }
}

/// Which year fields a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePattern {
    BothDates,
    StartOnly,
    EndOnly,
    NoDates,
}

impl DatePattern {
    pub fn of(record: &Record) -> Self {
        match (record.start_year.is_some(), record.end_year.is_some()) {
            (true, true) => DatePattern::BothDates,
            (true, false) => DatePattern::StartOnly,
            (false, true) => DatePattern::EndOnly,
            (false, false) => DatePattern::NoDates,
        }
    }
}

/// How many records fall under each [`DatePattern`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCounts {
    pub both_dates: usize,
    pub start_only: usize,
    pub end_only: usize,
    pub no_dates: usize,
}

impl PatternCounts {
    pub fn tally(records: &[Record]) -> Self {
        let mut c = PatternCounts::default();
        for r in records {
            match DatePattern::of(r) {
                DatePattern::BothDates => c.both_dates += 1,
                DatePattern::StartOnly => c.start_only += 1,
                DatePattern::EndOnly => c.end_only += 1,
                DatePattern::NoDates => c.no_dates += 1,
            }
        }
        c
    }

    /// Records with at least one year.
    pub fn dated(&self) -> usize {
        self.both_dates + self.start_only + self.end_only
    }

    /// The most frequent pattern. On a tie the later pattern in the order
    /// both, start-only, end-only, none wins.
    pub fn dominant(&self) -> DatePattern {
        [
            (DatePattern::BothDates, self.both_dates),
            (DatePattern::StartOnly, self.start_only),
            (DatePattern::EndOnly, self.end_only),
            (DatePattern::NoDates, self.no_dates),
        ]
        .into_iter()
        .fold((DatePattern::BothDates, self.both_dates), |best, cur| {
            if cur.1 >= best.1 { cur } else { best }
        })
        .0
    }
}

/// Single-year restriction of the timeseries view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum YearFilter {
    #[default]
    All,
    /// Keep records whose start or end year renders as this string.
    Year(String),
}

impl FromStr for YearFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() || t == crate::filters::ALL {
            Ok(YearFilter::All)
        } else {
            Ok(YearFilter::Year(t.to_string()))
        }
    }
}

impl From<i32> for YearFilter {
    fn from(y: i32) -> Self {
        YearFilter::Year(y.to_string())
    }
}

impl YearFilter {
    fn admits(&self, record: &Record) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Year(want) => [record.start_year.as_ref(), record.end_year.as_ref()]
                .into_iter()
                .flatten()
                .any(|y| y.to_string() == *want),
        }
    }
}

/// Presentation hint derived from the date mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    Line,
    Bar,
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartStyle::Line => "line",
            ChartStyle::Bar => "bar",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeseries {
    /// Ascending by year, one point per year.
    pub points: Vec<TimeseriesPoint>,
    pub has_end_year_only: bool,
    pub patterns: PatternCounts,
}

impl Timeseries {
    pub fn style(&self) -> ChartStyle {
        if self.has_end_year_only {
            ChartStyle::Bar
        } else {
            ChartStyle::Line
        }
    }
}

/// Bucket with the default threshold.
pub fn bucket(records: &[Record], metric: Metric, year_filter: &YearFilter) -> Timeseries {
    bucket_with(records, metric, year_filter, &BucketConfig::default())
}

pub fn bucket_with(
    records: &[Record],
    metric: Metric,
    year_filter: &YearFilter,
    config: &BucketConfig,
) -> Timeseries {
    let patterns = PatternCounts::tally(records);
    let dominant = patterns.dominant();
    let has_end_year_only = dominant == DatePattern::EndOnly
        || patterns.end_only as f64 > patterns.dated() as f64 * config.end_only_threshold;
    debug!(
        "timeseries patterns {:?}, dominant {:?}, end-year-only {}",
        patterns, dominant, has_end_year_only
    );

    struct YearAcc {
        sum: f64,
        count: usize,
        has_start: bool,
        has_end: bool,
    }

    let mut by_year: AHashMap<i32, YearAcc> = AHashMap::new();
    for r in records {
        if DatePattern::of(r) == DatePattern::NoDates || !year_filter.admits(r) {
            continue;
        }
        // Start year wins whenever present; a present but unparsable start
        // year drops the record rather than falling back to the end year.
        let Some(year) = r.start_year.as_ref().or(r.end_year.as_ref()).and_then(|y| y.as_year())
        else {
            continue;
        };
        let acc = by_year.entry(year).or_insert(YearAcc {
            sum: 0.0,
            count: 0,
            has_start: false,
            has_end: false,
        });
        acc.sum += r.metric(metric);
        acc.count += 1;
        acc.has_start |= r.start_year.is_some();
        acc.has_end |= r.end_year.is_some();
    }

    let mut points: Vec<TimeseriesPoint> = by_year
        .into_iter()
        .map(|(year, a)| TimeseriesPoint {
            year,
            value: a.sum / a.count as f64,
            count: a.count,
            has_start_year: a.has_start,
            has_end_year: a.has_end,
        })
        .collect();
    points.sort_by_key(|p| p.year);

    Timeseries {
        points,
        has_end_year_only,
        patterns,
    }
}
