//! Reconciliation of dataset country names with a geometry dataset's names.
//!
//! The insight records spell countries one way ("United States", "Russia"),
//! the world-boundaries geometry another ("United States of America",
//! "Russian Federation"). [`NameMap::build`] pairs them up so that per-country
//! aggregates can be joined onto map features.
//!
//! Matching is exact (case-insensitive) first, then the first geometry name in
//! list order that contains the dataset name or is contained by it. The
//! containment step is greedy: "Congo" pairs with whichever Congo comes first
//! in the geometry list. Unmatched names stay unmapped and render as "no data".

use crate::filters::ALL;
use crate::models::AggregateGroup;
use ahash::AHashMap;
use anyhow::{Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lookup direction for [`NameMap::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Dataset spelling to geometry spelling.
    ToGeometry,
    /// Geometry spelling to dataset spelling.
    ToDataset,
}

/// How a dataset name found its geometry counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Contains,
}

/// Bidirectional map between the two spellings, keyed by lower-cased name.
///
/// Read-only after construction. When two dataset names pair with the same
/// geometry name, the reverse entry holds the later one.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    to_geometry: AHashMap<String, String>,
    to_dataset: AHashMap<String, String>,
    kinds: AHashMap<String, MatchKind>,
}

impl NameMap {
    /// Pair every dataset name with a geometry name where possible.
    ///
    /// The `"all"` sentinel and blank names are skipped.
    pub fn build<D, G>(dataset_names: &[D], geometry_names: &[G]) -> Self
    where
        D: AsRef<str>,
        G: AsRef<str>,
    {
        let geo: Vec<(String, &str)> = geometry_names
            .iter()
            .map(|g| g.as_ref())
            .filter(|g| !g.trim().is_empty())
            .map(|g| (g.to_lowercase(), g))
            .collect();

        let mut map = NameMap::default();
        for name in dataset_names {
            let name = name.as_ref();
            if name.trim().is_empty() || name == ALL {
                continue;
            }
            let lower = name.to_lowercase();
            let hit = geo
                .iter()
                .find(|(g, _)| *g == lower)
                .map(|(_, orig)| (*orig, MatchKind::Exact))
                .or_else(|| {
                    geo.iter()
                        .find(|(g, _)| g.contains(lower.as_str()) || lower.contains(g.as_str()))
                        .map(|(_, orig)| (*orig, MatchKind::Contains))
                });
            match hit {
                Some((geo_name, kind)) => {
                    debug!("matched `{}` -> `{}` ({:?})", name, geo_name, kind);
                    map.to_geometry.insert(lower.clone(), geo_name.to_string());
                    map.to_dataset.insert(geo_name.to_lowercase(), name.to_string());
                    map.kinds.insert(lower, kind);
                }
                None => debug!("no geometry match for `{}`", name),
            }
        }
        map
    }

    /// Counterpart spelling of `name` in the given direction.
    pub fn resolve(&self, name: &str, direction: Direction) -> Option<&str> {
        let key = name.to_lowercase();
        match direction {
            Direction::ToGeometry => self.to_geometry.get(&key),
            Direction::ToDataset => self.to_dataset.get(&key),
        }
        .map(String::as_str)
    }

    /// Counterpart spelling of `name` in whichever direction knows it.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.resolve(name, Direction::ToGeometry)
            .or_else(|| self.resolve(name, Direction::ToDataset))
    }

    pub fn match_kind(&self, dataset_name: &str) -> Option<MatchKind> {
        self.kinds.get(&dataset_name.to_lowercase()).copied()
    }

    /// Number of matched dataset names.
    pub fn len(&self) -> usize {
        self.to_geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_geometry.is_empty()
    }

    /// Matched pairs as (dataset name lower-cased, geometry name), sorted.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let mut v: Vec<(&str, &str)> = self
            .to_geometry
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        v.sort_unstable();
        v
    }
}

/// A geometry feature with the aggregate joined onto it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethCell {
    pub feature: String,
    pub data: Option<AggregateGroup>,
}

/// Attach aggregate groups to geometry features.
///
/// A feature takes the group whose name equals its own (case-insensitive), or
/// the group found under its mapped dataset spelling.
pub fn join<G: AsRef<str>>(
    features: &[G],
    groups: &[AggregateGroup],
    names: &NameMap,
) -> Vec<ChoroplethCell> {
    let mut by_name: AHashMap<String, &AggregateGroup> = AHashMap::new();
    for g in groups {
        let lower = g.name.to_lowercase();
        if let Some(mapped) = names.resolve(&lower, Direction::ToGeometry) {
            by_name.insert(mapped.to_lowercase(), g);
        }
        by_name.insert(lower, g);
    }

    features
        .iter()
        .map(|f| {
            let f = f.as_ref();
            let lower = f.to_lowercase();
            let data = by_name
                .get(&lower)
                .or_else(|| {
                    names
                        .lookup(&lower)
                        .and_then(|m| by_name.get(&m.to_lowercase()))
                })
                .map(|g| (*g).clone());
            ChoroplethCell {
                feature: f.to_string(),
                data,
            }
        })
        .collect()
}

/// Feature names from a TopoJSON topology or a GeoJSON feature collection.
///
/// For TopoJSON the `countries` layer is read when present, otherwise every
/// layer in document order. Features without a `name` property, or with a
/// blank one, are skipped.
pub fn feature_names(doc: &Value) -> Result<Vec<String>> {
    fn name_of(feature: &Value) -> Option<String> {
        feature
            .get("properties")?
            .get("name")?
            .as_str()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
    }

    match doc.get("type").and_then(Value::as_str) {
        Some("Topology") => {
            let Some(objects) = doc.get("objects").and_then(Value::as_object) else {
                bail!("topology has no `objects`");
            };
            let layers: Vec<&Value> = match objects.get("countries") {
                Some(layer) => vec![layer],
                None => objects.values().collect(),
            };
            Ok(layers
                .into_iter()
                .filter_map(|l| l.get("geometries").and_then(Value::as_array))
                .flatten()
                .filter_map(name_of)
                .collect())
        }
        Some("FeatureCollection") => {
            let Some(features) = doc.get("features").and_then(Value::as_array) else {
                bail!("feature collection has no `features` array");
            };
            Ok(features.iter().filter_map(name_of).collect())
        }
        other => bail!("unsupported geometry document type: {:?}", other),
    }
}
