//! Names known to have no cross-identification data, with the reason why.

use crate::error::{XrefError, XrefResult};
use crate::names::StarName;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Default bad-name file name inside the reference directory.
pub const BAD_NAMES_FILE_NAME: &str = "bad_starname_ignore.csv";

#[derive(Debug, Deserialize)]
struct BadNameRow {
    name: String,
    reason: String,
}

/// Read-only set of names the remote catalog is known not to resolve.
#[derive(Debug, Clone, Default)]
pub struct BadNameList {
    reasons: HashMap<StarName, String>,
}

impl BadNameList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `name,reason` CSV. A missing file is an empty list.
    ///
    /// Rows whose name does not parse are skipped with a warning; the list is
    /// advisory and one bad row should not block resolution.
    pub fn load(path: impl AsRef<Path>) -> XrefResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = ?path, "no bad-name list found, using an empty one");
            return Ok(Self::new());
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut reasons = HashMap::new();
        for (number, row) in reader.deserialize::<BadNameRow>().enumerate() {
            let row =
                row.map_err(|e| XrefError::malformed_record(path, number + 2, e.to_string()))?;
            match StarName::parse(&row.name) {
                Ok(name) => {
                    reasons.insert(name, row.reason.trim().to_string());
                }
                Err(e) => warn!(path = ?path, line = number + 2, "skipping bad-name entry: {e}"),
            }
        }
        debug!(path = ?path, entries = reasons.len(), "loaded bad-name list");
        Ok(Self { reasons })
    }

    pub fn from_entries<I, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (StarName, R)>,
        R: Into<String>,
    {
        Self {
            reasons: entries
                .into_iter()
                .map(|(name, reason)| (name, reason.into()))
                .collect(),
        }
    }

    pub fn contains(&self, name: &StarName) -> bool {
        self.reasons.contains_key(name)
    }

    pub fn reason(&self, name: &StarName) -> Option<&str> {
        self.reasons.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let list = BadNameList::load(dir.path().join(BAD_NAMES_FILE_NAME)).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BAD_NAMES_FILE_NAME);
        fs::write(
            &path,
            "name,reason\nHD 999999,not in SIMBAD\n\"BD+99 1\",\"typo in source paper, see erratum\"\nbogus,ignored\n",
        )
        .unwrap();
        let list = BadNameList::load(&path).unwrap();
        assert_eq!(list.len(), 2);
        let hd = StarName::parse("hd 999999").unwrap();
        assert!(list.contains(&hd));
        assert_eq!(list.reason(&hd), Some("not in SIMBAD"));
        assert_eq!(
            list.reason(&StarName::parse("BD+99 1").unwrap()),
            Some("typo in source paper, see erratum")
        );
        assert!(!list.contains(&StarName::parse("HD 1").unwrap()));
    }

    #[test]
    fn test_from_entries() {
        let name = StarName::parse("HIP 1").unwrap();
        let list = BadNameList::from_entries([(name.clone(), "withdrawn")]);
        assert_eq!(list.reason(&name), Some("withdrawn"));
    }
}
