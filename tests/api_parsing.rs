use insights_rs::models::{DimensionProfile, FilterOptions, RegionProfile};
use insights_rs::{AggregateGroup, Record, YearValue};

#[test]
fn parse_data_documents() {
    let sample = r#"
    [
      {
        "_id": {"$oid": "5db6c60e4f3d0c9e9bc1b3a1"},
        "end_year": "",
        "intensity": 6,
        "sector": "Energy",
        "topic": "gas",
        "insight": "Annual Energy Outlook",
        "url": "http://www.eia.gov/outlooks/aeo/pdf/0383(2017).pdf",
        "region": "Northern America",
        "start_year": "",
        "impact": "",
        "added": "January, 20 2017 03:51:25",
        "published": "January, 09 2017 00:00:00",
        "country": "United States of America",
        "relevance": 2,
        "pestle": "Industries",
        "source": "EIA",
        "title": "U.S. natural gas consumption is expected to increase during much of the projection period.",
        "likelihood": 3
      },
      {
        "end_year": 2018,
        "intensity": "",
        "sector": "",
        "topic": "oil",
        "region": "World",
        "start_year": 2016,
        "country": "",
        "relevance": 3,
        "pestle": "Economic",
        "source": "Reuters",
        "likelihood": 4
      }
    ]
    "#;

    let rows: Vec<Record> = serde_json::from_str(sample).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].country.as_deref(), Some("United States of America"));
    assert_eq!(rows[0].start_year, None);
    assert_eq!(rows[0].end_year, None);
    assert_eq!(rows[0].intensity, 6.0);
    assert_eq!(rows[1].intensity, 0.0);
    assert_eq!(rows[1].sector, None);
    assert_eq!(rows[1].start_year, Some(YearValue::Year(2016)));
    assert_eq!(rows[1].end_year, Some(YearValue::Year(2018)));
}

#[test]
fn parse_top_n_and_profiles() {
    let top: Vec<AggregateGroup> =
        serde_json::from_str(r#"[{"name":"Lebanon","value":32.5,"count":2}]"#).unwrap();
    assert_eq!(top[0].count, 2);

    let sectors: Vec<DimensionProfile> = serde_json::from_str(
        r#"[{"sector":"Energy","intensity":9.1,"likelihood":2.9,"relevance":2.2,"count":294}]"#,
    )
    .unwrap();
    assert_eq!(sectors[0].name, "Energy");
    assert_eq!(sectors[0].count, 294);

    let pest: Vec<DimensionProfile> = serde_json::from_str(
        r#"[{"pestle":"Economic","intensity":null,"likelihood":3,"relevance":2,"count":546}]"#,
    )
    .unwrap();
    assert_eq!(pest[0].name, "Economic");
    assert_eq!(pest[0].intensity, 0.0);

    let regions: Vec<RegionProfile> = serde_json::from_str(
        r#"[{"region":"World","intensity":7.5,"likelihood":3.1,"relevance":2.4,"count":89,
             "sources":["EIA","Reuters"],"topics":["oil"]}]"#,
    )
    .unwrap();
    assert_eq!(regions[0].sources.len(), 2);
}

#[test]
fn parse_filter_options_without_cities() {
    let opts: FilterOptions = serde_json::from_str(
        r#"{"end_year":["2016","2017"],"topics":["oil"],"sectors":[],"regions":["World"],
            "pestle":["Economic"],"sources":["EIA"],"countries":["India"]}"#,
    )
    .unwrap();
    assert_eq!(opts.end_year, ["2016", "2017"]);
    assert!(opts.cities.is_empty());
}
