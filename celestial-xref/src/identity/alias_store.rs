//! File-backed list of alias sets, one line per star.
//!
//! The file is read whole into memory and rewritten whole on save. Lines are
//! `|`-delimited full alias strings sorted descending, and the lines
//! themselves are sorted, so saving the same content always yields the same
//! bytes.

use crate::error::{XrefError, XrefResult};
use crate::index::{Claims, LookupIndex};
use crate::names::{AliasSet, CatalogType, StarName};
use crate::persist::replace_file;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default alias reference file name inside the reference directory.
pub const ALIAS_FILE_NAME: &str = "simbad_ref_data.txt";

impl Claims for AliasSet {
    type Key = StarName;

    fn claim_keys(&self) -> Vec<StarName> {
        self.names().collect()
    }

    fn absorb(&mut self, other: Self) {
        self.union(&other);
    }

    fn describe(&self) -> String {
        self.to_line()
    }
}

pub struct AliasStore {
    path: PathBuf,
    records: Option<Vec<AliasSet>>,
    index: Option<LookupIndex<StarName>>,
}

impl AliasStore {
    /// Creates a store for `path` without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: None,
            index: None,
        }
    }

    /// Creates a store and loads it immediately.
    pub fn open(path: impl Into<PathBuf>) -> XrefResult<Self> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory records with the file's content.
    ///
    /// A missing file is an empty store. The index is dropped and rebuilt on
    /// the next lookup.
    pub fn load(&mut self) -> XrefResult<()> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "no alias reference file yet, starting empty");
                self.records = Some(Vec::new());
                self.index = None;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let aliases = AliasSet::from_line(line.trim())
                .map_err(|e| XrefError::malformed_record(&self.path, number + 1, e.to_string()))?;
            if !aliases.is_empty() {
                records.push(aliases);
            }
        }
        debug!(path = ?self.path, records = records.len(), "loaded alias reference file");
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

    /// Rebuilds the lookup index, merging any records that share an alias.
    pub fn rebuild_index(&mut self) -> XrefResult<&LookupIndex<StarName>> {
        self.ensure_loaded()?;
        let records = self.records.get_or_insert_with(Vec::new);
        let index = self.index.insert(LookupIndex::rebuild(records));
        Ok(&*index)
    }

    fn ensure_index(&mut self) -> XrefResult<()> {
        if self.index.is_none() {
            self.rebuild_index()?;
        }
        Ok(())
    }

    /// The alias set that owns `name`, if any.
    pub fn find(&mut self, name: &StarName) -> XrefResult<Option<&AliasSet>> {
        self.ensure_index()?;
        let position = self.index.as_ref().and_then(|index| index.get(name));
        Ok(position.and_then(|i| self.records.as_ref().and_then(|r| r.get(i))))
    }

    pub fn contains(&mut self, name: &StarName) -> XrefResult<bool> {
        Ok(self.find(name)?.is_some())
    }

    /// Appends records. The index goes stale until the next lookup or save.
    pub fn add<I>(&mut self, sets: I) -> XrefResult<()>
    where
        I: IntoIterator<Item = AliasSet>,
    {
        self.ensure_loaded()?;
        let records = self.records.get_or_insert_with(Vec::new);
        records.extend(sets.into_iter().filter(|s| !s.is_empty()));
        self.index = None;
        Ok(())
    }

    /// Applies pending merges and rewrites the whole file.
    pub fn save(&mut self) -> XrefResult<()> {
        self.rebuild_index()?;
        let mut lines: Vec<String> = self
            .records()
            .iter()
            .map(AliasSet::to_line)
            .collect();
        lines.sort();
        replace_file(&self.path, |writer| {
            for line in &lines {
                writeln!(writer, "{}", line)?;
            }
            Ok(())
        })?;
        debug!(path = ?self.path, records = lines.len(), "saved alias reference file");
        Ok(())
    }

    /// Records in store order. Empty if the store has not been loaded.
    pub fn records(&self) -> &[AliasSet] {
        self.records.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Every identifier on file under `catalog`.
    pub fn known_ids(&mut self, catalog: CatalogType) -> XrefResult<BTreeSet<String>> {
        self.ensure_index()?;
        Ok(self
            .index
            .as_ref()
            .map(|index| {
                index
                    .keys()
                    .filter(|name| name.catalog == catalog)
                    .map(|name| name.id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Duplicate records merged by the most recent index rebuild.
    pub fn last_merge_count(&self) -> usize {
        self.index.as_ref().map_or(0, LookupIndex::merges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn name(text: &str) -> StarName {
        StarName::parse(text).unwrap()
    }

    fn set(names: &[&str]) -> AliasSet {
        names.iter().map(|n| name(n)).collect()
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AliasStore::open(dir.path().join(ALIAS_FILE_NAME)).unwrap();
        assert!(store.is_empty());
        assert!(store.find(&name("HD 1")).unwrap().is_none());
    }

    #[test]
    fn test_add_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AliasStore::new(dir.path().join(ALIAS_FILE_NAME));
        store.add([set(&["HD 1234", "TYC 999-1-1"])]).unwrap();
        let found = store.find(&name("TYC 999-1-1")).unwrap().unwrap();
        assert!(found.contains(&name("HD 1234")));
    }

    #[test]
    fn test_save_format_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE_NAME);
        let mut store = AliasStore::new(&path);
        store
            .add([set(&["HIP 5", "HD 9"]), set(&["HD 1234", "Gaia DR2 55", "TYC 999-1-1"])])
            .unwrap();
        store.save().unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "HIP 5|HD 9\nTYC 999-1-1|HD 1234|Gaia DR2 55\n");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE_NAME);
        let originals = vec![
            set(&["HD 1", "BD+43 44", "* alf Cen"]),
            set(&["Kepler-22", "2MASS J1939-5055"]),
        ];
        let mut store = AliasStore::new(&path);
        store.add(originals.clone()).unwrap();
        store.save().unwrap();

        let reloaded = AliasStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), originals.len());
        for original in &originals {
            assert!(reloaded.records().contains(original));
        }
    }

    #[test]
    fn test_save_applies_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE_NAME);
        let mut store = AliasStore::new(&path);
        store
            .add([
                set(&["HD 1", "Gaia DR2 77"]),
                set(&["TYC 2-2-1"]),
                set(&["TYC 2-2-1", "Gaia DR2 77"]),
            ])
            .unwrap();
        store.save().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.last_merge_count(), 2);

        let mut reloaded = AliasStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        let merged = reloaded.find(&name("HD 1")).unwrap().unwrap();
        assert_eq!(merged, &set(&["HD 1", "TYC 2-2-1", "Gaia DR2 77"]));
    }

    #[test]
    fn test_load_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE_NAME);
        fs::write(&path, "HD 1|HIP 1\n\nHD 2|nonsense\n").unwrap();
        let err = AliasStore::open(&path).err().unwrap();
        match err {
            XrefError::MalformedRecord { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_replaces_unsaved_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AliasStore::new(dir.path().join(ALIAS_FILE_NAME));
        store.add([set(&["HD 1"])]).unwrap();
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_known_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AliasStore::new(dir.path().join(ALIAS_FILE_NAME));
        store
            .add([set(&["HD 1", "HIP 3"]), set(&["HD 2"])])
            .unwrap();
        let ids = store.known_ids(CatalogType::Hd).unwrap();
        let expected: BTreeSet<String> = ["1", "2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, expected);
        assert!(store.known_ids(CatalogType::Tyc).unwrap().is_empty());
    }
}
