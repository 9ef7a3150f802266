use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn data_file() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    fs::write(
        &path,
        r#"[
          {"country":"USA","intensity":4,"start_year":2010,"pestle":"Economic","topic":"oil"},
          {"country":"USA","intensity":6,"start_year":2010,"pestle":"Economic","topic":"gas"},
          {"country":"India","intensity":2,"start_year":2012,"pestle":"Political","topic":"oil"}
        ]"#,
    )
    .unwrap();
    (dir, path)
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("insights").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("insights"));
}

#[test]
fn top_from_local_file_as_json() {
    let (_dir, path) = data_file();
    let mut cmd = Command::cargo_bin("insights").unwrap();
    cmd.args(["top", "--by", "country", "--limit", "1", "--json", "--input"])
        .arg(&path);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v, serde_json::json!([{"name": "USA", "value": 5.0, "count": 2}]));
}

#[test]
fn timeseries_table_with_filter() {
    let (_dir, path) = data_file();
    let mut cmd = Command::cargo_bin("insights").unwrap();
    cmd.args(["timeseries", "--filter", "topic=oil", "--filter", "region=all", "--input"])
        .arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("style=line"))
        .stdout(predicate::str::contains("2010  value=4"))
        .stdout(predicate::str::contains("2012  value=2"));
}

#[test]
fn summary_and_options() {
    let (_dir, path) = data_file();
    Command::cargo_bin("insights")
        .unwrap()
        .args(["summary", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("records: 3"));
    Command::cargo_bin("insights")
        .unwrap()
        .args(["options", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("countries  (2) India, USA"));
}

#[test]
fn geo_join_with_local_geometry() {
    let (dir, path) = data_file();
    let geometry = dir.path().join("world.json");
    fs::write(
        &geometry,
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"United States of America"},"geometry":null},
            {"type":"Feature","properties":{"name":"India"},"geometry":null},
            {"type":"Feature","properties":{"name":"Chile"},"geometry":null}
        ]}"#,
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("insights").unwrap();
    cmd.args(["geo", "--json", "--input"])
        .arg(&path)
        .arg("--geometry")
        .arg(&geometry);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    // "USA" has no exact or containment match in this geometry
    assert_eq!(v["matched"], 1);
    assert_eq!(v["cells"][1]["data"]["name"], "India");
    assert!(v["cells"][2]["data"].is_null());
}

#[test]
fn bad_dimension_and_filter_fail() {
    let (_dir, path) = data_file();
    Command::cargo_bin("insights")
        .unwrap()
        .args(["top", "--by", "planet", "--input"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("planet"));
    Command::cargo_bin("insights")
        .unwrap()
        .args(["groups", "--filter", "oops", "--input"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("oops"));
}
