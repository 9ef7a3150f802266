//! Where records come from: the remote data service or a local file.

use crate::api::Client;
use crate::filters::NormalizedFilters;
use crate::models::Record;
use crate::storage;
use anyhow::Result;
use log::debug;
use std::path::PathBuf;

/// A provider of fully materialized record sets.
pub trait RecordSource {
    /// Every record satisfying `filters`.
    fn records(&self, filters: &NormalizedFilters) -> Result<Vec<Record>>;
}

impl RecordSource for Client {
    fn records(&self, filters: &NormalizedFilters) -> Result<Vec<Record>> {
        self.fetch_records(filters)
    }
}

/// Records read from a `.csv` or `.json` file, filtered locally.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FileSource {
    fn records(&self, filters: &NormalizedFilters) -> Result<Vec<Record>> {
        let all = storage::load_records(&self.path)?;
        let total = all.len();
        let out: Vec<Record> = if filters.is_empty() {
            all
        } else {
            let m = filters.matcher();
            all.into_iter().filter(|r| m.matches(r)).collect()
        };
        debug!("{}: {} of {} records pass filters", self.path.display(), out.len(), total);
        Ok(out)
    }
}

/// Records held in memory, filtered locally.
impl RecordSource for [Record] {
    fn records(&self, filters: &NormalizedFilters) -> Result<Vec<Record>> {
        Ok(filters.apply(self).into_iter().cloned().collect())
    }
}
