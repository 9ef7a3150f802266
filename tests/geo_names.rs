use insights_rs::geo::{self, MatchKind};
use insights_rs::{AggregateGroup, Direction, NameMap};
use serde_json::json;

#[test]
fn exact_match_beats_containment() {
    let m = NameMap::build(&["France"], &["French Guiana", "France"]);
    assert_eq!(m.resolve("france", Direction::ToGeometry), Some("France"));
    assert_eq!(m.match_kind("France"), Some(MatchKind::Exact));

    let m = NameMap::build(&["France"], &["France", "French Guiana"]);
    assert_eq!(m.resolve("France", Direction::ToGeometry), Some("France"));
}

#[test]
fn containment_works_both_ways() {
    let m = NameMap::build(
        &["United States", "Russian Federation of Stuff"],
        &["Canada", "United States of America", "Russian Federation"],
    );
    assert_eq!(
        m.resolve("united states", Direction::ToGeometry),
        Some("United States of America")
    );
    assert_eq!(
        m.resolve("Russian Federation of Stuff", Direction::ToGeometry),
        Some("Russian Federation")
    );
    assert_eq!(m.match_kind("United States"), Some(MatchKind::Contains));
}

#[test]
fn containment_takes_first_in_geometry_order() {
    let m = NameMap::build(&["Congo"], &["Dem. Rep. Congo", "Congo Republic"]);
    assert_eq!(m.resolve("congo", Direction::ToGeometry), Some("Dem. Rep. Congo"));
}

#[test]
fn unmatched_names_are_absent() {
    let m = NameMap::build(&["Atlantis", "India"], &["India", "Nepal"]);
    assert_eq!(m.resolve("Atlantis", Direction::ToGeometry), None);
    assert_eq!(m.resolve("Nepal", Direction::ToDataset), None);
    assert_eq!(m.len(), 1);
}

#[test]
fn map_is_symmetric() {
    let dataset = ["USA", "India", "United Kingdom", "Iran", "South Africa"];
    let geometry = [
        "India",
        "United Kingdom",
        "Iran (Islamic Republic of)",
        "South Africa",
        "Nepal",
    ];
    let m = NameMap::build(&dataset, &geometry);
    assert!(!m.is_empty());
    for (a, b) in m.pairs() {
        let back = m.resolve(b, Direction::ToDataset).unwrap();
        assert_eq!(back.to_lowercase(), a);
    }
    // geometry-side lookups use the geometry spelling, case-insensitive
    assert_eq!(m.resolve("IRAN (ISLAMIC REPUBLIC OF)", Direction::ToDataset), Some("Iran"));
    assert_eq!(m.lookup("iran"), Some("Iran (Islamic Republic of)"));
}

#[test]
fn join_attaches_groups_by_own_or_mapped_name() {
    let features = ["United States of America", "India", "Nepal"];
    let groups = vec![
        AggregateGroup { name: "United States".into(), value: 5.0, count: 2 },
        AggregateGroup { name: "india".into(), value: 2.0, count: 1 },
    ];
    let names = NameMap::build(&["United States", "India"], &features);
    let cells = geo::join(&features, &groups, &names);
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0].data.as_ref().unwrap().name, "United States");
    assert_eq!(cells[1].data.as_ref().unwrap().value, 2.0);
    assert!(cells[2].data.is_none());
}

#[test]
fn feature_names_from_topojson_and_geojson() {
    let topo = json!({
        "type": "Topology",
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "properties": {"name": "Fiji"}},
                    {"type": "Polygon", "properties": {}},
                    {"type": "Polygon", "properties": {"name": "Tanzania"}}
                ]
            },
            "land": {"type": "GeometryCollection", "geometries": []}
        }
    });
    assert_eq!(geo::feature_names(&topo).unwrap(), ["Fiji", "Tanzania"]);

    let gj = json!({
        "type": "FeatureCollection",
        "features": [{"type": "Feature", "properties": {"name": "Chile"}, "geometry": null}]
    });
    assert_eq!(geo::feature_names(&gj).unwrap(), ["Chile"]);

    assert!(geo::feature_names(&json!({"type": "Point"})).is_err());
}
