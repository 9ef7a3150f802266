use crate::models::Record;
use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Load records from a CSV file with a header row.
///
/// Columns are matched by name; missing columns fall back to the record
/// defaults and unknown columns are ignored.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_csv(f).with_context(|| format!("read {}", path.display()))
}

/// Cells are handed to the record decoder as text, so a column such as
/// `country` keeps `007` as written instead of becoming the number 7.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().context("read header row")?.clone();
    let mut out = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("row {}", i + 1))?;
        let doc: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        let rec: Record =
            serde_json::from_value(Value::Object(doc)).with_context(|| format!("row {}", i + 1))?;
        out.push(rec);
    }
    Ok(out)
}

/// Load records from a JSON array of documents.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {}", path.display()))
}

/// Load records, choosing the format from the file extension.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => bail!("unsupported record file format: {:?} ({})", other, path.display()),
    }
}
