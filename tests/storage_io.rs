use insights_rs::filters::{FilterSet, normalize};
use insights_rs::storage;
use insights_rs::{FileSource, Record, RecordSource, YearValue};
use std::fs;
use tempfile::tempdir;

const CSV: &str = "\
end_year,intensity,sector,topic,region,start_year,country,relevance,pestle,source,likelihood,city
,6,Energy,gas,Northern America,,United States of America,2,Industries,EIA,3,
2018,,,oil,World,2016,,3,Economic,Reuters,4,
2030, 2 ,Retail,oil,Southern Asia,2017,India,1,Political,EIA,2,Mumbai
";

#[test]
fn load_csv_with_blanks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("insights.csv");
    fs::write(&path, CSV).unwrap();

    let rows = storage::load_records(&path).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].start_year, None);
    assert_eq!(rows[0].intensity, 6.0);
    assert_eq!(rows[1].intensity, 0.0);
    assert_eq!(rows[1].country, None);
    assert_eq!(rows[1].start_year, Some(YearValue::Year(2016)));
    assert_eq!(rows[2].intensity, 2.0);
    assert_eq!(rows[2].city.as_deref(), Some("Mumbai"));
}

#[test]
fn load_json_array() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("insights.JSON");
    fs::write(
        &path,
        r#"[{"country":"India","intensity":4,"start_year":2017},{"likelihood":"3"}]"#,
    )
    .unwrap();
    let rows = storage::load_records(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].likelihood, 3.0);
}

#[test]
fn file_source_applies_filters_locally() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("insights.csv");
    fs::write(&path, CSV).unwrap();

    let mut f = FilterSet::new();
    f.insert("topic", "oil");
    f.insert("source", "all");
    let rows = FileSource::new(&path).records(&normalize(&f)).unwrap();
    assert_eq!(rows.len(), 2);

    let f: FilterSet = "topic=oil&source=EIA".parse().unwrap();
    let rows = FileSource::new(&path).records(&normalize(&f)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].country.as_deref(), Some("India"));
}

#[test]
fn in_memory_slice_is_a_source() {
    let rows = vec![
        Record { sector: Some("Energy".into()), ..Default::default() },
        Record { sector: Some("Retail".into()), ..Default::default() },
    ];
    let f: FilterSet = "sector=Retail".parse().unwrap();
    let got = rows.as_slice().records(&normalize(&f)).unwrap();
    assert_eq!(got.len(), 1);
}

#[test]
fn bad_files_are_errors() {
    let dir = tempdir().unwrap();
    assert!(storage::load_records(dir.path().join("missing.csv")).is_err());
    let path = dir.path().join("broken.json");
    fs::write(&path, "{not json").unwrap();
    assert!(storage::load_records(&path).is_err());
}
