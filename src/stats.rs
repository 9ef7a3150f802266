use crate::aggregate::UNKNOWN;
use crate::models::{AggregateGroup, Dimension, Metric, Record};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder rendered for a missing number.
pub const MISSING: &str = "N/A";

/// Default truncation length for chart labels.
pub const LABEL_MAX: usize = 25;

/// Summary statistics of one metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub metric: Metric,
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute count, min, max, mean and median of `metric` over `records`.
pub fn summary(records: &[Record], metric: Metric) -> Summary {
    let mut vals: Vec<f64> = records.iter().map(|r| r.metric(metric)).collect();
    vals.sort_by(|a, b| a.total_cmp(b));
    let count = vals.len();
    let min = vals.first().cloned();
    let max = vals.last().cloned();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    Summary { metric, count, min, max, mean, median }
}

/// Magnitude-aware display of a number.
///
/// `0` prints as `"0"`, magnitudes below one with two decimals, thousands and
/// millions with one decimal and a `K`/`M` suffix, everything else rounded to
/// an integer. `None` prints as [`MISSING`].
pub fn format_number(value: Option<f64>) -> String {
    let Some(v) = value else {
        return MISSING.to_string();
    };
    if v == 0.0 {
        return "0".to_string();
    }
    let a = v.abs();
    if a < 1.0 {
        format!("{:.2}", v)
    } else if a >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if a >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        format!("{}", v.round())
    }
}

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `de`, `fr`, `es`, `it`, `pt`, `nl`
/// and their `xx_XX` forms. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en,
    }
}

/// Record counts with thousands separators, e.g. `12,345`.
pub fn format_count(n: usize, locale_tag: &str) -> String {
    n.to_formatted_string(map_locale(locale_tag))
}

/// Share of one item in a pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub name: String,
    pub value: f64,
    /// Percent of the total, rounded to one decimal.
    pub percentage: f64,
}

/// `value / total * 100` for every value, rounded to one decimal.
/// A zero total yields `0.0` for every entry.
pub fn percentages(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|v| {
            if total == 0.0 {
                0.0
            } else {
                (v / total * 1000.0).round() / 10.0
            }
        })
        .collect()
}

/// Shares of each group's mean value.
pub fn value_shares(groups: &[AggregateGroup]) -> Vec<Share> {
    shares(groups, |g| g.value)
}

/// Shares of each group's record count.
pub fn count_shares(groups: &[AggregateGroup]) -> Vec<Share> {
    shares(groups, |g| g.count as f64)
}

fn shares(groups: &[AggregateGroup], pick: impl Fn(&AggregateGroup) -> f64) -> Vec<Share> {
    let values: Vec<f64> = groups.iter().map(&pick).collect();
    groups
        .iter()
        .zip(values.iter().zip(percentages(&values)))
        .map(|(g, (v, p))| Share {
            name: g.name.clone(),
            value: *v,
            percentage: p,
        })
        .collect()
}

/// Partition records by `dimension`. Absent values land under `"Unknown"`.
///
/// Unlike the aggregation engine, nothing is dropped here.
pub fn group_by_field(records: &[Record], dimension: Dimension) -> BTreeMap<String, Vec<&Record>> {
    let mut out: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    for r in records {
        let key = r.dimension(dimension).unwrap_or(UNKNOWN);
        out.entry(key.to_string()).or_default().push(r);
    }
    out
}

/// Cut `text` to `max` characters and append `...` when it was longer.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut s: String = text.chars().take(max).collect();
        s.push_str("...");
        s
    } else {
        text.to_string()
    }
}

/// Records that carry a value for every dimension in `required`.
pub fn complete_records<'a>(records: &'a [Record], required: &[Dimension]) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| required.iter().all(|d| r.dimension(*d).is_some()))
        .collect()
}
