use crate::error::InsightError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric score carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Intensity,
    Likelihood,
    Relevance,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Intensity, Metric::Likelihood, Metric::Relevance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Intensity => "intensity",
            Metric::Likelihood => "likelihood",
            Metric::Relevance => "relevance",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intensity" => Ok(Metric::Intensity),
            "likelihood" => Ok(Metric::Likelihood),
            "relevance" => Ok(Metric::Relevance),
            _ => Err(InsightError::InvalidMetric(s.to_string())),
        }
    }
}

/// Categorical field used to group records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Country,
    Topic,
    Sector,
    Region,
    Pestle,
    Source,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Country,
        Dimension::Topic,
        Dimension::Sector,
        Dimension::Region,
        Dimension::Pestle,
        Dimension::Source,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Country => "country",
            Dimension::Topic => "topic",
            Dimension::Sector => "sector",
            Dimension::Region => "region",
            Dimension::Pestle => "pestle",
            Dimension::Source => "source",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "country" => Ok(Dimension::Country),
            "topic" => Ok(Dimension::Topic),
            "sector" => Ok(Dimension::Sector),
            "region" => Ok(Dimension::Region),
            "pestle" => Ok(Dimension::Pestle),
            "source" => Ok(Dimension::Source),
            _ => Err(InsightError::InvalidDimension(s.to_string())),
        }
    }
}

/// A start or end year as delivered by the data service.
///
/// Most documents carry a plain integer, but some exports hold free text in
/// the year columns. Those are kept as `Unparsed` so the record still decodes;
/// year-based bucketing skips them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum YearValue {
    Year(i32),
    Unparsed(String),
}

impl YearValue {
    /// The integer year, if the raw value parsed as one.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            YearValue::Year(y) => Some(*y),
            YearValue::Unparsed(_) => None,
        }
    }
}

impl fmt::Display for YearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearValue::Year(y) => write!(f, "{}", y),
            YearValue::Unparsed(s) => f.write_str(s),
        }
    }
}

impl From<i32> for YearValue {
    fn from(y: i32) -> Self {
        YearValue::Year(y)
    }
}

/// One observational event.
///
/// Categorical fields are `None` when the source document left them out or
/// sent an empty string. Metrics default to `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "de_metric")]
    pub intensity: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub likelihood: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub relevance: f64,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub pestle: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de_opt_year", skip_serializing_if = "Option::is_none")]
    pub start_year: Option<YearValue>,
    #[serde(default, deserialize_with = "de_opt_year", skip_serializing_if = "Option::is_none")]
    pub end_year: Option<YearValue>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Record {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Intensity => self.intensity,
            Metric::Likelihood => self.likelihood,
            Metric::Relevance => self.relevance,
        }
    }

    /// Value of a grouping dimension. Blank strings count as absent.
    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        let v = match dimension {
            Dimension::Country => self.country.as_deref(),
            Dimension::Topic => self.topic.as_deref(),
            Dimension::Sector => self.sector.as_deref(),
            Dimension::Region => self.region.as_deref(),
            Dimension::Pestle => self.pestle.as_deref(),
            Dimension::Source => self.source.as_deref(),
        };
        v.filter(|s| !s.trim().is_empty())
    }
}

/// One group produced by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateGroup {
    pub name: String,
    pub value: f64,
    pub count: usize,
}

/// One year of a bucketed timeseries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesPoint {
    pub year: i32,
    pub value: f64,
    pub count: usize,
    pub has_start_year: bool,
    pub has_end_year: bool,
}

/// Per-value profile across all three metrics (sectors, topics, PESTLE).
///
/// The service names the key field after the dimension (`"sector"`, `"topic"`,
/// `"pestle"`); all of them decode into `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionProfile {
    #[serde(alias = "sector", alias = "topic", alias = "pestle", alias = "country")]
    pub name: String,
    pub count: usize,
    #[serde(default, deserialize_with = "de_metric")]
    pub intensity: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub likelihood: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub relevance: f64,
}

/// Region profile: metric means plus the topics and sources seen in the region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: String,
    pub count: usize,
    #[serde(default, deserialize_with = "de_metric")]
    pub intensity: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub likelihood: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub relevance: f64,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Distinct values available for each filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub end_year: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub pestle: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
}

/// Serde helper: a metric may arrive as a number, a numeric string, an empty
/// string, or `null`. Anything that is not a number becomes `0.0`.
fn de_metric<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct MetricVisitor;

    impl<'de> Visitor<'de> for MetricVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a number, a numeric string, or null")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f64)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f64)
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(if v.is_finite() { v } else { 0.0 })
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(s.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0))
        }

        fn visit_bool<E>(self, _v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0.0)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(MetricVisitor)
}

/// Serde helper: optional text where `""`, whitespace, and `null` mean absent.
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a string or null")
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t.to_string()) })
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// Serde helper: a year may be a number or a string. `0`, `""` and `null` are
/// treated as absent; other non-numeric strings are kept as `Unparsed`.
fn de_opt_year<'de, D>(deserializer: D) -> Result<Option<YearValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = Option<YearValue>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a year as integer or string, or null")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match i64::try_from(v) {
                Ok(v) => self.visit_i64(v),
                Err(_) => Ok(Some(YearValue::Unparsed(v.to_string()))),
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v == 0 {
                return Ok(None);
            }
            match i32::try_from(v) {
                Ok(y) => Ok(Some(YearValue::Year(y))),
                Err(_) => Ok(Some(YearValue::Unparsed(v.to_string()))),
            }
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v == 0.0 || !v.is_finite() {
                return Ok(None);
            }
            if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 {
                Ok(Some(YearValue::Year(v as i32)))
            } else {
                Ok(Some(YearValue::Unparsed(v.to_string())))
            }
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let t = s.trim();
            if t.is_empty() {
                return Ok(None);
            }
            match t.parse::<i32>() {
                Ok(0) => Ok(None),
                Ok(y) => Ok(Some(YearValue::Year(y))),
                Err(_) => Ok(Some(YearValue::Unparsed(t.to_string()))),
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(YearVisitor)
}
