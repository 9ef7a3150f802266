//! insights_rs
//!
//! A Rust library for turning flat insight records (intensity, likelihood,
//! relevance plus country/topic/sector/region/PESTLE/source dimensions) into
//! chart-ready aggregates. Pairs with the `insights` CLI.
//!
//! ### Features
//! - Normalize user filters before any remote or local query
//! - Top-N ranking and full grouping by any dimension
//! - Year bucketing that copes with records carrying start year, end year,
//!   both, or neither, and picks bar or line presentation
//! - Country-name reconciliation against a world-geometry dataset for
//!   choropleth joins
//! - Number formatting, percentage shares, summaries
//!
//! ### Example
//! ```
//! use insights_rs::{Dimension, Metric, Record, aggregate};
//!
//! let rec = |c: &str, i: f64| Record {
//!     country: Some(c.into()),
//!     intensity: i,
//!     ..Default::default()
//! };
//! let rows = vec![rec("USA", 4.0), rec("USA", 6.0), rec("India", 2.0)];
//! let top = aggregate::top_n(&rows, Dimension::Country, Metric::Intensity, 1, None);
//! assert_eq!(top[0].name, "USA");
//! assert_eq!(top[0].value, 5.0);
//! assert_eq!(top[0].count, 2);
//! ```

pub mod aggregate;
pub mod api;
pub mod error;
pub mod filters;
pub mod geo;
pub mod models;
pub mod source;
pub mod stats;
pub mod storage;
pub mod timeseries;

pub use api::Client;
pub use error::InsightError;
pub use geo::{Direction, NameMap};
pub use models::{AggregateGroup, Dimension, Metric, Record, TimeseriesPoint, YearValue};
pub use source::{FileSource, RecordSource};
