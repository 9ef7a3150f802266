//! Synchronous client for the **insights data service**.
//!
//! The service exposes raw records plus server-side aggregates over the same
//! data. Every method takes [`NormalizedFilters`], so sentinel and blank
//! filter values never reach the wire.
//!
//! ### Notes
//! - Transient failures (5xx, connection errors) are retried with a short
//!   backoff; 4xx responses fail immediately and surface the service's
//!   `{"error": "..."}` message when present.
//! - Network timeouts default to 30s and can be adjusted via [`ClientConfig`].
//!
//! Typical usage:
//! ```no_run
//! # use insights_rs::{Client, Dimension, Metric};
//! # use insights_rs::filters::{FilterSet, normalize};
//! let client = Client::default();
//! let mut f = FilterSet::new();
//! f.insert("region", "all");
//! f.insert("sector", "Energy");
//! let top = client.fetch_top_n(Metric::Intensity, Dimension::Country, 10, &normalize(&f))?;
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::filters::NormalizedFilters;
use crate::models::{
    AggregateGroup, Dimension, DimensionProfile, FilterOptions, Metric, Record, RegionProfile,
};
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Default location of the data service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// World boundaries used by the choropleth.
pub const DEFAULT_GEOMETRY_URL: &str = "https://unpkg.com/world-atlas@2.0.2/countries-110m.json";

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Total request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Sleep before each retry of a transient failure.
    pub backoff_ms: Vec<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            backoff_ms: vec![100, 300, 700],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    backoff_ms: Vec<u64>,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default()).expect("reqwest client build")
    }
}

// Allow -, _, . unescaped in query values
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, SAFE).to_string()
}

/// Render `key=value` pairs as a query string (without the leading `?`).
pub fn query_string<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", enc(k.as_ref()), enc(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(5))
            .user_agent(concat!("insights_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            backoff_ms: config.backoff_ms,
            http,
        })
    }

    /// Full URL of `endpoint` with leading params followed by the filters.
    pub fn url(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        filters: &NormalizedFilters,
    ) -> String {
        let mut pairs: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        pairs.extend(filters.query_pairs());
        let qs = query_string(pairs);
        if qs.is_empty() {
            format!("{}/{}", self.base_url, endpoint)
        } else {
            format!("{}/{}?{}", self.base_url, endpoint, qs)
        }
    }

    /// GET with a small retry for transient failures (5xx / network errors).
    fn get_json(&self, url: &str) -> Result<Value> {
        let mut last_err: Option<anyhow::Error> = None;
        for backoff_ms in self.backoff_ms.iter().copied().chain(std::iter::once(0)) {
            debug!("GET {}", url);
            match self.http.get(url).send() {
                Ok(r) if r.status().is_success() => {
                    return r.json().context("decode json");
                }
                Ok(r) if r.status().is_server_error() => {
                    warn!("GET {} failed with HTTP {}; retrying", url, r.status());
                    last_err = Some(anyhow::anyhow!("HTTP {}", r.status()));
                }
                Ok(r) => {
                    let status = r.status();
                    let body: Option<Value> = r.json().ok();
                    bail!("{}", api_error(status, body.as_ref()));
                }
                Err(e) => last_err = Some(e.into()),
            }
            if backoff_ms > 0 {
                std::thread::sleep(Duration::from_millis(backoff_ms));
            }
        }
        bail!("network error: {:?}", last_err);
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let v = self.get_json(url).with_context(|| format!("GET {}", url))?;
        serde_json::from_value(v).with_context(|| format!("parse response of {}", url))
    }

    /// Raw records matching `filters`.
    pub fn fetch_records(&self, filters: &NormalizedFilters) -> Result<Vec<Record>> {
        self.get(&self.url("data", &[], filters))
    }

    /// Distinct values for every filter.
    pub fn fetch_filter_options(&self) -> Result<FilterOptions> {
        self.get(&self.url("filters", &[], &NormalizedFilters::none()))
    }

    /// Server-side equivalent of [`crate::aggregate::top_n`].
    pub fn fetch_top_n(
        &self,
        metric: Metric,
        dimension: Dimension,
        limit: usize,
        filters: &NormalizedFilters,
    ) -> Result<Vec<AggregateGroup>> {
        let params = [
            ("metric", metric.to_string()),
            ("group_by", dimension.to_string()),
            ("limit", limit.to_string()),
        ];
        self.get(&self.url("topN", &params, filters))
    }

    pub fn fetch_regions(&self, filters: &NormalizedFilters) -> Result<Vec<RegionProfile>> {
        self.get(&self.url("regions", &[], filters))
    }

    pub fn fetch_sectors(&self, filters: &NormalizedFilters) -> Result<Vec<DimensionProfile>> {
        self.get(&self.url("sectors", &[], filters))
    }

    /// Topic profiles. Pass `exact_match` through a normalizer that preserves
    /// it, otherwise `exact_match=false` is dropped and the service falls back
    /// to its default.
    pub fn fetch_topics(&self, filters: &NormalizedFilters) -> Result<Vec<DimensionProfile>> {
        self.get(&self.url("topics", &[], filters))
    }

    pub fn fetch_pest(&self, filters: &NormalizedFilters) -> Result<Vec<DimensionProfile>> {
        self.get(&self.url("pest", &[], filters))
    }

    /// Up to 20 records for one country.
    pub fn fetch_country_insights(
        &self,
        country: &str,
        filters: &NormalizedFilters,
    ) -> Result<Vec<Record>> {
        self.get(&self.country_insights_url(country, filters)?)
    }

    /// `country` always leads the query; a `country` filter is dropped.
    fn country_insights_url(&self, country: &str, filters: &NormalizedFilters) -> Result<String> {
        if country.trim().is_empty() {
            bail!("country is required");
        }
        let params = [("country", country.to_string())];
        Ok(self.url("country-insights", &params, &filters.without("country")))
    }

    /// Download a geometry document (TopoJSON or GeoJSON) from `url`.
    pub fn fetch_geometry(&self, url: &str) -> Result<Value> {
        self.get_json(url).with_context(|| format!("GET {}", url))
    }
}

fn api_error(status: StatusCode, body: Option<&Value>) -> String {
    match body.and_then(|b| b.get("error")).and_then(Value::as_str) {
        Some(msg) => format!("insights api error (HTTP {}): {}", status, msg),
        None => format!("request failed with HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterSet, normalize};
    use serde_json::json;

    #[test]
    fn url_puts_params_before_filters() {
        let cli = Client::new(ClientConfig {
            base_url: "http://host/api/".into(),
            ..Default::default()
        })
        .unwrap();
        let mut f = FilterSet::new();
        f.insert("region", "all");
        f.insert("topic", "oil & gas");
        let url = cli.url("topN", &[("limit", "5".into())], &normalize(&f));
        assert_eq!(url, "http://host/api/topN?limit=5&topic=oil%20%26%20gas");
        assert_eq!(cli.url("filters", &[], &NormalizedFilters::none()), "http://host/api/filters");
    }

    #[test]
    fn country_insights_url_leads_with_country() {
        let cli = Client::new(ClientConfig {
            base_url: "http://host/api".into(),
            ..Default::default()
        })
        .unwrap();
        let f: FilterSet = "country=Chile&pestle=Economic&region=all".parse().unwrap();
        let url = cli.country_insights_url("United States of America", &normalize(&f)).unwrap();
        assert_eq!(
            url,
            "http://host/api/country-insights?country=United%20States%20of%20America&pestle=Economic"
        );
        assert!(cli.country_insights_url("  ", &NormalizedFilters::none()).is_err());
    }

    #[test]
    fn api_error_prefers_service_message() {
        let body = json!({"error": "Invalid metric"});
        let msg = api_error(StatusCode::BAD_REQUEST, Some(&body));
        assert!(msg.contains("Invalid metric"));
        assert!(api_error(StatusCode::NOT_FOUND, None).contains("404"));
    }
}
