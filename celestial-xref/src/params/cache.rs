//! Per-release parameter cache backed by a CSV reference file.
//!
//! The first column, `name`, holds the `|`-joined full Gaia names of the
//! entry; every other column is a raw provider field, in alphabetical order.
//! Each line is one measurement, so an entry with several measurements spans
//! several lines with the same `name` cell. Missing values are empty, and an
//! entry written as a single all-empty line is a cached "no data" result.

use super::row::ParamRow;
use crate::error::{XrefError, XrefResult};
use crate::index::{Claims, LookupIndex};
use crate::names::{GaiaRelease, StarName, ALIAS_DELIMITER};
use crate::persist::replace_file;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

const NAME_COLUMN: &str = "name";

/// One cached source: its ids within the release and every distinct
/// measurement recorded for them. No measurements means "no data".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEntry {
    pub ids: BTreeSet<String>,
    rows: Vec<ParamRow>,
}

impl ParamEntry {
    /// Entry holding `row`, or no measurement if `row` is empty.
    pub fn new<I, S>(ids: I, row: ParamRow) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entry = Self {
            ids: ids.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        };
        entry.push(row);
        entry
    }

    /// Adds a measurement. Empty and already recorded rows are ignored.
    pub fn push(&mut self, row: ParamRow) -> bool {
        if row.is_empty() || self.rows.contains(&row) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn rows(&self) -> &[ParamRow] {
        &self.rows
    }

    /// Whether this is a cached "no data" result.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Claims for ParamEntry {
    type Key = String;

    fn claim_keys(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    fn absorb(&mut self, other: Self) {
        self.ids.extend(other.ids);
        for row in other.rows {
            self.push(row);
        }
    }

    fn describe(&self) -> String {
        self.ids.iter().cloned().collect::<Vec<_>>().join("|")
    }
}

pub struct ParamCache {
    release: GaiaRelease,
    path: PathBuf,
    records: Option<Vec<ParamEntry>>,
    index: Option<LookupIndex<String>>,
}

impl ParamCache {
    /// Cache for `release` in `reference_dir`, under the release's file name.
    pub fn new(release: GaiaRelease, reference_dir: impl AsRef<Path>) -> Self {
        Self::with_path(release, reference_dir.as_ref().join(release.ref_file_name()))
    }

    pub fn with_path(release: GaiaRelease, path: impl Into<PathBuf>) -> Self {
        Self {
            release,
            path: path.into(),
            records: None,
            index: None,
        }
    }

    pub fn release(&self) -> GaiaRelease {
        self.release
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory entries with the file's content.
    pub fn load(&mut self) -> XrefResult<()> {
        if !self.path.exists() {
            debug!(path = ?self.path, release = %self.release, "no parameter cache file yet");
            self.records = Some(Vec::new());
            self.index = None;
            return Ok(());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        if headers.get(0) != Some(NAME_COLUMN) {
            return Err(XrefError::malformed_record(
                &self.path,
                1,
                format!("first column must be '{}'", NAME_COLUMN),
            ));
        }

        let mut records: Vec<ParamEntry> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (number, record) in reader.records().enumerate() {
            let line = number + 2;
            let record = record?;
            let name_cell = record.get(0).unwrap_or("").trim();
            let mut row = ParamRow::new();
            for (field, cell) in headers.iter().zip(record.iter()).skip(1) {
                let value = cell.trim();
                if !value.is_empty() {
                    row.insert(field, value);
                }
            }
            if let Some(&position) = by_name.get(name_cell) {
                records[position].push(row);
                continue;
            }

            let mut ids = BTreeSet::new();
            for text in split_cell(name_cell) {
                let name = StarName::parse(text)
                    .map_err(|e| XrefError::malformed_record(&self.path, line, e.to_string()))?;
                if name.catalog != self.release.catalog_type() {
                    return Err(XrefError::ProviderMismatch {
                        path: self.path.clone(),
                        expected: self.release.catalog_type().tag().to_string(),
                        found: name.to_string(),
                    });
                }
                ids.insert(name.id);
            }
            if ids.is_empty() {
                return Err(XrefError::malformed_record(&self.path, line, "row has no name"));
            }
            by_name.insert(name_cell.to_string(), records.len());
            records.push(ParamEntry::new(ids, row));
        }
        debug!(
            path = ?self.path,
            release = %self.release,
            entries = records.len(),
            "loaded parameter cache"
        );
        self.records = Some(records);
        self.index = None;
        Ok(())
    }

    fn ensure_loaded(&mut self) -> XrefResult<()> {
        if self.records.is_none() {
            self.load()?;
        }
        Ok(())
    }

    /// Rebuilds the id index, merging entries that share an id.
    pub fn rebuild_index(&mut self) -> XrefResult<&LookupIndex<String>> {
        self.ensure_loaded()?;
        let records = self.records.get_or_insert_with(Vec::new);
        let index = self.index.insert(LookupIndex::rebuild(records));
        Ok(&*index)
    }

    /// The cached measurements of source `id`. An empty slice means
    /// "no data".
    pub fn find(&mut self, id: &str) -> XrefResult<Option<&[ParamRow]>> {
        if self.index.is_none() {
            self.rebuild_index()?;
        }
        let position = self.index.as_ref().and_then(|index| index.get(&id.to_string()));
        Ok(position
            .and_then(|i| self.records.as_ref().and_then(|r| r.get(i)))
            .map(ParamEntry::rows))
    }

    pub fn contains(&mut self, id: &str) -> XrefResult<bool> {
        Ok(self.find(id)?.is_some())
    }

    /// Appends an entry. The index goes stale until the next lookup or save.
    pub fn add(&mut self, entry: ParamEntry) -> XrefResult<()> {
        self.ensure_loaded()?;
        if !entry.ids.is_empty() {
            self.records.get_or_insert_with(Vec::new).push(entry);
            self.index = None;
        }
        Ok(())
    }

    /// Applies pending merges and rewrites the whole file.
    pub fn save(&mut self) -> XrefResult<()> {
        self.rebuild_index()?;
        let tag = self.release.catalog_type();
        let fields: BTreeSet<&str> = self
            .entries()
            .iter()
            .flat_map(|entry| entry.rows.iter().flat_map(ParamRow::field_names))
            .collect();

        let empty = ParamRow::new();

        let mut rows: Vec<Vec<String>> = self
            .entries()
            .iter()
            .flat_map(|entry| {
                let names: Vec<String> = entry
                    .ids
                    .iter()
                    .map(|id| format!("{}{}{}", tag.tag(), tag.separator(), id))
                    .collect();
                let name_cell = names.join(&ALIAS_DELIMITER.to_string());
                let measurements = if entry.is_empty() {
                    std::slice::from_ref(&empty)
                } else {
                    entry.rows()
                };
                measurements
                    .iter()
                    .map(|row| {
                        let mut cells = vec![name_cell.clone()];
                        for field in &fields {
                            cells.push(row.get(field).unwrap_or_default().to_string());
                        }
                        cells
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort();

        let mut header = vec![NAME_COLUMN.to_string()];
        header.extend(fields.iter().map(|f| f.to_string()));

        replace_file(&self.path, |writer| {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(&header)?;
            for row in &rows {
                csv_writer.write_record(row)?;
            }
            csv_writer.flush()?;
            Ok(())
        })?;
        debug!(
            path = ?self.path,
            release = %self.release,
            lines = rows.len(),
            "saved parameter cache"
        );
        Ok(())
    }

    /// Entries in store order. Empty if the cache has not been loaded.
    pub fn entries(&self) -> &[ParamEntry] {
        self.records.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Number of cached "no data" entries.
    pub fn empty_count(&self) -> usize {
        self.entries().iter().filter(|e| e.is_empty()).count()
    }

    /// Duplicate entries merged by the most recent index rebuild.
    pub fn last_merge_count(&self) -> usize {
        self.index.as_ref().map_or(0, LookupIndex::merges)
    }
}

fn split_cell(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(ALIAS_DELIMITER)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(fields: &[(&str, &str)]) -> ParamRow {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_file_name_per_release() {
        let cache = ParamCache::new(GaiaRelease::Dr2, "/tmp/ref");
        assert_eq!(cache.path(), Path::new("/tmp/ref/GaiaDR2_ref.csv"));
    }

    #[test]
    fn test_save_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ParamCache::new(GaiaRelease::Dr2, dir.path());
        cache
            .add(ParamEntry::new(["200"], row(&[("pmra", "3.5"), ("parallax", "1.2")])))
            .unwrap();
        cache.add(ParamEntry::new(["100"], ParamRow::new())).unwrap();
        cache.save().unwrap();

        let content = fs::read_to_string(cache.path()).unwrap();
        assert_eq!(
            content,
            "name,parallax,pmra\nGaia DR2 100,,\nGaia DR2 200,1.2,3.5\n"
        );
    }

    #[test]
    fn test_round_trip_with_empty_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ParamCache::new(GaiaRelease::Dr3, dir.path());
        let mut entry = ParamEntry::new(["7"], row(&[("parallax", "1.2")]));
        entry.push(row(&[("parallax", "1.3")]));
        cache.add(entry).unwrap();
        cache.add(ParamEntry::new(["8"], ParamRow::new())).unwrap();
        cache.save().unwrap();

        let mut reloaded = ParamCache::new(GaiaRelease::Dr3, dir.path());
        reloaded.load().unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.empty_count(), 1);
        let seven = reloaded.find("7").unwrap().unwrap();
        assert_eq!(seven, &[row(&[("parallax", "1.2")]), row(&[("parallax", "1.3")])]);
        assert!(reloaded.find("8").unwrap().unwrap().is_empty());
        assert!(reloaded.find("9").unwrap().is_none());
        assert_eq!(reloaded.last_merge_count(), 0);
    }

    #[test]
    fn test_merge_keeps_measurements_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ParamCache::new(GaiaRelease::Dr2, dir.path());
        cache
            .add(ParamEntry::new(["1"], row(&[("parallax", "9.0"), ("parallax_error", "0.1")])))
            .unwrap();
        cache
            .add(ParamEntry::new(
                ["1", "2"],
                row(&[("parallax", "10.0"), ("parallax_error", "0.9"), ("pmra", "4")]),
            ))
            .unwrap();
        cache.save().unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.last_merge_count(), 1);

        let content = fs::read_to_string(cache.path()).unwrap();
        assert_eq!(
            content,
            "name,parallax,parallax_error,pmra\n\
             Gaia DR2 1|Gaia DR2 2,10.0,0.9,4\n\
             Gaia DR2 1|Gaia DR2 2,9.0,0.1,\n"
        );

        let mut reloaded = ParamCache::new(GaiaRelease::Dr2, dir.path());
        let merged = reloaded.find("2").unwrap().unwrap();
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&row(&[("parallax", "9.0"), ("parallax_error", "0.1")])));
        assert!(merged.contains(&row(&[
            ("parallax", "10.0"),
            ("parallax_error", "0.9"),
            ("pmra", "4"),
        ])));
        assert_eq!(reloaded.last_merge_count(), 0);
    }

    #[test]
    fn test_duplicate_measurement_recorded_once() {
        let mut entry = ParamEntry::new(["1"], row(&[("parallax", "9.0")]));
        assert!(!entry.push(row(&[("parallax", "9.0")])));
        assert!(!entry.push(ParamRow::new()));
        assert_eq!(entry.rows().len(), 1);
    }

    #[test]
    fn test_provider_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(GaiaRelease::Dr2.ref_file_name());
        fs::write(&path, "name,parallax\nGaia DR1 5,1.0\n").unwrap();
        let mut cache = ParamCache::with_path(GaiaRelease::Dr2, &path);
        match cache.load() {
            Err(XrefError::ProviderMismatch { expected, found, .. }) => {
                assert_eq!(expected, "Gaia DR2");
                assert_eq!(found, "Gaia DR1 5");
            }
            other => panic!("expected provider mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,parallax\n5,1.0\n").unwrap();
        let mut cache = ParamCache::with_path(GaiaRelease::Dr2, &path);
        assert!(matches!(
            cache.load(),
            Err(XrefError::MalformedRecord { line: 1, .. })
        ));
    }
}
