//! Grouping and ranking of records into chart-ready aggregates.
//!
//! The core pair is [`group_all`] (one [`AggregateGroup`] per distinct
//! dimension value, first-seen order) and [`top_n`] (the same groups ranked by
//! mean value and truncated). Both are pure and return empty vectors for empty
//! input.
//!
//! The remaining functions re-derive locally what the data service computes
//! for the sector/topic/PESTLE/region panels, the per-year metric table, the
//! dashboard header, and the choropleth tooltips.

use crate::filters::NormalizedFilters;
use crate::models::{
    AggregateGroup, Dimension, DimensionProfile, FilterOptions, Metric, Record, RegionProfile,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Bucket name for records with no value under the grouping dimension.
pub const UNKNOWN: &str = "Unknown";

/// What to do with records whose grouping key is absent or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Skip the record.
    #[default]
    Drop,
    /// Count it under [`UNKNOWN`].
    Bucket,
}

#[derive(Default)]
struct Acc {
    sum: f64,
    count: usize,
}

/// Group records by `dimension`, computing the mean of `metric` per group.
/// Records without a value for `dimension` are dropped.
pub fn group_all(records: &[Record], dimension: Dimension, metric: Metric) -> Vec<AggregateGroup> {
    group_all_with(records.iter(), dimension, metric, UnknownKeys::Drop)
}

/// [`group_all`] with an explicit policy for absent keys.
///
/// Groups come out in the order their key was first seen.
pub fn group_all_with<'a, I>(
    records: I,
    dimension: Dimension,
    metric: Metric,
    unknown: UnknownKeys,
) -> Vec<AggregateGroup>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut index: AHashMap<&'a str, usize> = AHashMap::new();
    let mut accs: Vec<(&'a str, Acc)> = Vec::new();

    for r in records {
        let key = match (r.dimension(dimension), unknown) {
            (Some(k), _) => k,
            (None, UnknownKeys::Bucket) => UNKNOWN,
            (None, UnknownKeys::Drop) => continue,
        };
        let slot = *index.entry(key).or_insert_with(|| {
            accs.push((key, Acc::default()));
            accs.len() - 1
        });
        let acc = &mut accs[slot].1;
        acc.sum += r.metric(metric);
        acc.count += 1;
    }

    accs.into_iter()
        .map(|(name, acc)| AggregateGroup {
            name: name.to_string(),
            value: acc.sum / acc.count as f64,
            count: acc.count,
        })
        .collect()
}

/// Order by value descending, then count descending, then name ascending.
pub fn rank_order(a: &AggregateGroup, b: &AggregateGroup) -> Ordering {
    b.value
        .partial_cmp(&a.value)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort groups by [`rank_order`] and keep the first `limit`.
pub fn rank(mut groups: Vec<AggregateGroup>, limit: usize) -> Vec<AggregateGroup> {
    groups.sort_by(rank_order);
    groups.truncate(limit);
    groups
}

/// The `limit` groups with the highest mean `metric`.
///
/// When `filters` is given, records are narrowed with the same semantics the
/// data service applies before grouping.
pub fn top_n(
    records: &[Record],
    dimension: Dimension,
    metric: Metric,
    limit: usize,
    filters: Option<&NormalizedFilters>,
) -> Vec<AggregateGroup> {
    let groups = match filters {
        Some(f) if !f.is_empty() => {
            let m = f.matcher();
            group_all_with(
                records.iter().filter(|r| m.matches(r)),
                dimension,
                metric,
                UnknownKeys::Drop,
            )
        }
        _ => group_all(records, dimension, metric),
    };
    rank(groups, limit)
}

/// Per-value profile of all three metrics, most frequent first.
///
/// Ties in count are broken by name. `limit` of `None` keeps every group.
pub fn profiles(
    records: &[Record],
    dimension: Dimension,
    limit: Option<usize>,
) -> Vec<DimensionProfile> {
    let mut groups: BTreeMap<&str, [f64; 4]> = BTreeMap::new();
    for r in records {
        let Some(key) = r.dimension(dimension) else {
            continue;
        };
        let acc = groups.entry(key).or_default();
        acc[0] += r.intensity;
        acc[1] += r.likelihood;
        acc[2] += r.relevance;
        acc[3] += 1.0;
    }

    let mut out: Vec<DimensionProfile> = groups
        .into_iter()
        .map(|(name, [i, l, rel, n])| DimensionProfile {
            name: name.to_string(),
            count: n as usize,
            intensity: i / n,
            likelihood: l / n,
            relevance: rel / n,
        })
        .collect();
    // BTreeMap iteration already orders by name; a stable sort keeps it for ties.
    out.sort_by(|a, b| b.count.cmp(&a.count));
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

/// Region profiles with the distinct topics and sources of each region.
pub fn region_profiles(records: &[Record]) -> Vec<RegionProfile> {
    let base = profiles(records, Dimension::Region, None);
    let mut topics: AHashMap<&str, BTreeSet<&str>> = AHashMap::new();
    let mut sources: AHashMap<&str, BTreeSet<&str>> = AHashMap::new();
    for r in records {
        let Some(region) = r.dimension(Dimension::Region) else {
            continue;
        };
        if let Some(t) = r.dimension(Dimension::Topic) {
            topics.entry(region).or_default().insert(t);
        }
        if let Some(s) = r.dimension(Dimension::Source) {
            sources.entry(region).or_default().insert(s);
        }
    }

    let collect = |m: &AHashMap<&str, BTreeSet<&str>>, k: &str| -> Vec<String> {
        m.get(k)
            .map(|s| s.iter().map(|v| v.to_string()).collect())
            .unwrap_or_default()
    };

    base.into_iter()
        .map(|p| RegionProfile {
            topics: collect(&topics, &p.name),
            sources: collect(&sources, &p.name),
            region: p.name,
            count: p.count,
            intensity: p.intensity,
            likelihood: p.likelihood,
            relevance: p.relevance,
        })
        .collect()
}

/// Key for [`metric_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// The record's start year.
    Year,
    Dimension(Dimension),
}

/// One row of the metric table: mean, count and sum per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub name: String,
    pub value: f64,
    pub count: usize,
    pub sum: f64,
}

/// Mean, count and sum of `metric` per key, sorted ascending by key.
///
/// Year keys sort numerically; records whose start year is absent or not an
/// integer are skipped.
pub fn metric_table(records: &[Record], group_by: GroupBy, metric: Metric) -> Vec<MetricRow> {
    match group_by {
        GroupBy::Year => {
            let mut years: BTreeMap<i32, Acc> = BTreeMap::new();
            for r in records {
                let Some(y) = r.start_year.as_ref().and_then(|y| y.as_year()) else {
                    continue;
                };
                let acc = years.entry(y).or_default();
                acc.sum += r.metric(metric);
                acc.count += 1;
            }
            years
                .into_iter()
                .map(|(y, acc)| row(y.to_string(), acc))
                .collect()
        }
        GroupBy::Dimension(d) => {
            let mut keys: BTreeMap<&str, Acc> = BTreeMap::new();
            for r in records {
                let Some(k) = r.dimension(d) else {
                    continue;
                };
                let acc = keys.entry(k).or_default();
                acc.sum += r.metric(metric);
                acc.count += 1;
            }
            keys.into_iter()
                .map(|(k, acc)| row(k.to_string(), acc))
                .collect()
        }
    }
}

fn row(name: String, acc: Acc) -> MetricRow {
    MetricRow {
        name,
        value: acc.sum / acc.count as f64,
        count: acc.count,
        sum: acc.sum,
    }
}

/// Header figures of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total: usize,
    pub avg_intensity: f64,
    pub avg_likelihood: f64,
    pub avg_relevance: f64,
}

pub fn overview(records: &[Record]) -> Overview {
    if records.is_empty() {
        return Overview::default();
    }
    let n = records.len() as f64;
    let mean = |m: Metric| records.iter().map(|r| r.metric(m)).sum::<f64>() / n;
    Overview {
        total: records.len(),
        avg_intensity: mean(Metric::Intensity),
        avg_likelihood: mean(Metric::Likelihood),
        avg_relevance: mean(Metric::Relevance),
    }
}

/// Count of one PESTLE category within a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PestleCount {
    pub pestle: String,
    pub count: usize,
}

/// PESTLE category counts per country, keyed by lower-cased country name.
/// Each list is sorted by count descending, ties by category name.
pub fn pestle_by_country(records: &[Record]) -> BTreeMap<String, Vec<PestleCount>> {
    let mut counts: BTreeMap<String, BTreeMap<&str, usize>> = BTreeMap::new();
    for r in records {
        let (Some(c), Some(p)) = (r.dimension(Dimension::Country), r.dimension(Dimension::Pestle))
        else {
            continue;
        };
        *counts.entry(c.to_lowercase()).or_default().entry(p).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(country, per)| {
            let mut list: Vec<PestleCount> = per
                .into_iter()
                .map(|(p, n)| PestleCount {
                    pestle: p.to_string(),
                    count: n,
                })
                .collect();
            list.sort_by(|a, b| b.count.cmp(&a.count));
            (country, list)
        })
        .collect()
}

/// Lower-cased country name to region. The last record seen for a country wins.
pub fn region_by_country(records: &[Record]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for r in records {
        let country = r.dimension(Dimension::Country);
        if let (Some(c), Some(reg)) = (country, r.dimension(Dimension::Region)) {
            out.insert(c.to_lowercase(), reg.to_string());
        }
    }
    out
}

/// Distinct non-empty values per filterable field.
///
/// Text values sort lexicographically; end years sort numerically, with
/// non-numeric years after the numeric ones.
pub fn filter_options(records: &[Record]) -> FilterOptions {
    fn distinct<'a>(it: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
        it.flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    let mut end_year: Vec<String> = records
        .iter()
        .filter_map(|r| r.end_year.as_ref().map(|y| y.to_string()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    end_year.sort_by(|a, b| match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });

    FilterOptions {
        end_year,
        topics: distinct(records.iter().map(|r| r.topic.as_deref())),
        sectors: distinct(records.iter().map(|r| r.sector.as_deref())),
        regions: distinct(records.iter().map(|r| r.region.as_deref())),
        pestle: distinct(records.iter().map(|r| r.pestle.as_deref())),
        sources: distinct(records.iter().map(|r| r.source.as_deref())),
        countries: distinct(records.iter().map(|r| r.country.as_deref())),
        cities: distinct(records.iter().map(|r| r.city.as_deref())),
    }
}
