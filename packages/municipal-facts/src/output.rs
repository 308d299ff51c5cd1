//! Persisted output: per-place JSON files and a combined collection.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::record::{PlaceOutcome, PlaceRecord};

/// Records keyed by slug. Merging a record replaces any record with the
/// same slug and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordCollection {
    records: IndexMap<String, PlaceRecord>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a collection file, or start empty when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the collection as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Insert or replace by slug, returning the replaced record.
    pub fn merge(&mut self, record: PlaceRecord) -> Option<PlaceRecord> {
        self.records.insert(record.slug.clone(), record)
    }

    /// Merge every record among `outcomes`; skips are not persisted.
    /// Returns how many records were merged.
    pub fn merge_outcomes<'a>(&mut self, outcomes: impl IntoIterator<Item = &'a PlaceOutcome>) -> usize {
        outcomes
            .into_iter()
            .filter_map(PlaceOutcome::record)
            .map(|record| self.merge(record.clone()))
            .count()
    }

    pub fn get(&self, slug: &str) -> Option<&PlaceRecord> {
        self.records.get(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Write one record to `{dir}/{slug}.json`.
pub fn save_record(dir: &Path, record: &PlaceRecord) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", record.slug));
    fs::write(&path, serde_json::to_string_pretty(record)?)?;
    Ok(path)
}
