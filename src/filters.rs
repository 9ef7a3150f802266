//! Filter normalization and local filter matching.
//!
//! A [`FilterSet`] is whatever the user picked in the filter panel, including
//! the sentinel `"all"` and blank values. [`normalize`] turns it into a
//! [`NormalizedFilters`], which is the only filter type the HTTP client and
//! the local record sources accept. In a normalized set, absence of a key is
//! "no constraint".
//!
//! ```
//! use insights_rs::filters::{FilterSet, FilterValue, Normalizer};
//!
//! let mut f = FilterSet::new();
//! f.insert("topic", "oil");
//! f.insert("region", "all");
//! f.insert("exact_match", FilterValue::Bool(false));
//!
//! let n = Normalizer::new().preserve("exact_match").normalize(&f);
//! let keys: Vec<&str> = n.iter().map(|(k, _)| k).collect();
//! assert_eq!(keys, ["topic", "exact_match"]);
//! ```

use crate::error::InsightError;
use crate::models::{Record, YearValue};
use log::{debug, warn};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter value meaning "apply no constraint for this key".
pub const ALL: &str = "all";

/// Key that switches `topic` from pattern matching to exact equality.
pub const EXACT_MATCH: &str = "exact_match";

/// A single filter value as picked in the UI or passed on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl FilterValue {
    /// Falsy in the JavaScript sense: `false`, `0`, `NaN`, `""`, `null`.
    pub fn is_falsy(&self) -> bool {
        match self {
            FilterValue::Bool(b) => !b,
            FilterValue::Number(n) => *n == 0.0 || n.is_nan(),
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Null => true,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s == ALL)
    }

    /// Parse a command-line value: `true`/`false` become booleans, everything
    /// else stays text (years compare as strings downstream).
    pub fn parse(s: &str) -> Self {
        match s {
            "true" => FilterValue::Bool(true),
            "false" => FilterValue::Bool(false),
            _ => FilterValue::Text(s.to_string()),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Number(n as f64)
    }
}

/// Ordered key/value filter mapping, as supplied by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place so key order is kept.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a set from `key=value` expressions (e.g. from repeated CLI flags).
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, InsightError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = FilterSet::new();
        for p in pairs {
            let p = p.as_ref();
            let (k, v) = p
                .split_once('=')
                .ok_or_else(|| InsightError::InvalidFilter(p.to_string()))?;
            let k = k.trim();
            if k.is_empty() {
                return Err(InsightError::InvalidFilter(p.to_string()));
            }
            set.insert(k, FilterValue::parse(v.trim()));
        }
        Ok(set)
    }
}

impl<K, V> FromIterator<(K, V)> for FilterSet
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut set = FilterSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl FromStr for FilterSet {
    type Err = InsightError;

    /// Parse `key=value` pairs separated by `&` or `,`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterSet::from_pairs(s.split(['&', ',']).filter(|p| !p.trim().is_empty()))
    }
}

/// Normalizer with an explicit list of keys that survive even when falsy.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    preserved: Vec<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `key` even when its value is falsy, because for that key "falsy"
    /// is itself a query instruction. The sentinel is still dropped.
    pub fn preserve(mut self, key: impl Into<String>) -> Self {
        self.preserved.push(key.into());
        self
    }

    pub fn normalize(&self, filters: &FilterSet) -> NormalizedFilters {
        let entries = filters
            .entries
            .iter()
            .filter(|(k, v)| {
                if v.is_sentinel() {
                    return false;
                }
                !v.is_falsy() || self.preserved.iter().any(|p| p == k)
            })
            .cloned()
            .collect();
        NormalizedFilters { entries }
    }
}

/// Drop sentinel and falsy entries; no key is preserved.
pub fn normalize(filters: &FilterSet) -> NormalizedFilters {
    Normalizer::new().normalize(filters)
}

/// A filter set with no sentinel and no empty values.
///
/// Only [`Normalizer::normalize`] constructs it, so every value of this type
/// upholds the invariant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFilters {
    entries: Vec<(String, FilterValue)>,
}

impl NormalizedFilters {
    /// No constraints at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy without `key`. Used when a caller handles one field itself (the
    /// timeseries view filters years locally).
    pub fn without(&self, key: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| k != key)
                .cloned()
                .collect(),
        }
    }

    /// Key/value pairs in key order, ready for a URL query string.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    fn exact_match(&self) -> bool {
        match self.get(EXACT_MATCH) {
            Some(FilterValue::Bool(b)) => *b,
            Some(FilterValue::Text(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Compile into a reusable record predicate.
    pub fn matcher(&self) -> RecordMatcher {
        let exact = self.exact_match();
        let mut checks = Vec::new();
        for (key, value) in &self.entries {
            let wanted = value.to_string();
            let check = match key.as_str() {
                EXACT_MATCH => continue,
                "topic" if !exact => {
                    match RegexBuilder::new(&wanted).case_insensitive(true).build() {
                        Ok(re) => Check::Pattern(re),
                        Err(e) => {
                            warn!(
                                "topic filter `{}` is not a valid pattern ({}); matching literally",
                                wanted, e
                            );
                            Check::Contains(wanted.to_lowercase())
                        }
                    }
                }
                "topic" => Check::Field(Field::Topic, wanted),
                "country" => Check::Field(Field::Country, wanted),
                "sector" => Check::Field(Field::Sector, wanted),
                "region" => Check::Field(Field::Region, wanted),
                "pestle" => Check::Field(Field::Pestle, wanted),
                "source" => Check::Field(Field::Source, wanted),
                "city" => Check::Field(Field::City, wanted),
                "start_year" => Check::Year(YearField::Start, wanted),
                "end_year" => Check::Year(YearField::End, wanted),
                other => {
                    debug!("filter key `{}` has no local equivalent; ignoring", other);
                    continue;
                }
            };
            checks.push(check);
        }
        RecordMatcher { checks }
    }

    /// Records satisfying every constraint, in input order.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let m = self.matcher();
        records.iter().filter(|r| m.matches(r)).collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Country,
    Topic,
    Sector,
    Region,
    Pestle,
    Source,
    City,
}

#[derive(Debug, Clone, Copy)]
enum YearField {
    Start,
    End,
}

#[derive(Debug)]
enum Check {
    Field(Field, String),
    Pattern(regex::Regex),
    Contains(String),
    Year(YearField, String),
}

/// Compiled form of a [`NormalizedFilters`].
#[derive(Debug)]
pub struct RecordMatcher {
    checks: Vec<Check>,
}

impl RecordMatcher {
    pub fn matches(&self, record: &Record) -> bool {
        self.checks.iter().all(|c| match c {
            Check::Field(f, wanted) => field(record, *f) == Some(wanted.as_str()),
            Check::Pattern(re) => record.topic.as_deref().is_some_and(|t| re.is_match(t)),
            Check::Contains(needle) => record
                .topic
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(needle.as_str())),
            Check::Year(y, wanted) => {
                let v: Option<&YearValue> = match y {
                    YearField::Start => record.start_year.as_ref(),
                    YearField::End => record.end_year.as_ref(),
                };
                v.is_some_and(|v| v.to_string() == *wanted)
            }
        })
    }
}

fn field(record: &Record, f: Field) -> Option<&str> {
    match f {
        Field::Country => record.country.as_deref(),
        Field::Topic => record.topic.as_deref(),
        Field::Sector => record.sector.as_deref(),
        Field::Region => record.region.as_deref(),
        Field::Pestle => record.pestle.as_deref(),
        Field::Source => record.source.as_deref(),
        Field::City => record.city.as_deref(),
    }
}
