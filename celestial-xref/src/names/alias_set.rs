//! The set of aliases one star is known by.

use super::catalog::CatalogType;
use super::star_name::StarName;
use crate::error::{XrefError, XrefResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Delimiter between aliases on one line of the alias reference file.
pub const ALIAS_DELIMITER: char = '|';

/// Catalog type → identifiers under that catalog.
///
/// Identifiers are unique per type; the same identifier string may appear
/// under different types. The only mutation is growth, through
/// [`insert`](Self::insert) and [`union`](Self::union).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasSet {
    ids: BTreeMap<CatalogType, BTreeSet<String>>,
}

impl AliasSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(name: StarName) -> Self {
        let mut set = Self::new();
        set.insert(name);
        set
    }

    /// Adds one alias. Returns `true` if it was not already present.
    pub fn insert(&mut self, name: StarName) -> bool {
        self.ids.entry(name.catalog).or_default().insert(name.id)
    }

    /// Adds every alias of `other` to this set.
    pub fn union(&mut self, other: &AliasSet) {
        for (catalog, ids) in &other.ids {
            self.ids
                .entry(*catalog)
                .or_default()
                .extend(ids.iter().cloned());
        }
    }

    pub fn contains(&self, name: &StarName) -> bool {
        self.ids
            .get(&name.catalog)
            .is_some_and(|ids| ids.contains(&name.id))
    }

    pub fn ids(&self, catalog: CatalogType) -> Option<&BTreeSet<String>> {
        self.ids.get(&catalog)
    }

    /// Catalog types present, in preference order.
    pub fn catalogs(&self) -> impl Iterator<Item = CatalogType> + '_ {
        self.ids.keys().copied()
    }

    /// Every alias, grouped by catalog type in preference order.
    pub fn names(&self) -> impl Iterator<Item = StarName> + '_ {
        self.ids.iter().flat_map(|(catalog, ids)| {
            ids.iter().map(move |id| StarName {
                catalog: *catalog,
                id: id.clone(),
            })
        })
    }

    /// Aliases that identify a Gaia source.
    pub fn gaia_names(&self) -> impl Iterator<Item = StarName> + '_ {
        self.names().filter(|n| n.catalog.gaia_release().is_some())
    }

    /// Total number of aliases across all types.
    pub fn len(&self) -> usize {
        self.ids.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The alias this star is referred to by.
    ///
    /// The first catalog type in preference order wins; within it the
    /// lexicographically smallest formatted name is taken. Every accepted type
    /// is in the ordering, so the only failure is an empty set, which no store
    /// ever produces.
    pub fn canonical_name(&self) -> XrefResult<StarName> {
        self.ids
            .iter()
            .find(|(_, ids)| !ids.is_empty())
            .and_then(|(catalog, ids)| {
                ids.iter()
                    .map(|id| StarName {
                        catalog: *catalog,
                        id: id.clone(),
                    })
                    .min_by_key(|name| name.to_string())
            })
            .ok_or_else(|| {
                XrefError::InvariantViolation(
                    "no catalog type of the preference ordering is present in the alias set"
                        .to_string(),
                )
            })
    }

    /// Handle form of [`canonical_name`](Self::canonical_name).
    pub fn handle(&self) -> XrefResult<String> {
        Ok(self.canonical_name()?.handle())
    }

    /// Serialized line form: all aliases, sorted descending, `|`-delimited.
    pub fn to_line(&self) -> String {
        let mut names: Vec<String> = self.names().map(|n| n.to_string()).collect();
        names.sort_unstable_by(|a, b| b.cmp(a));
        names.join(&ALIAS_DELIMITER.to_string())
    }

    /// Parses a line produced by [`to_line`](Self::to_line).
    pub fn from_line(line: &str) -> XrefResult<Self> {
        let mut set = Self::new();
        for part in line.split(ALIAS_DELIMITER) {
            if part.trim().is_empty() {
                continue;
            }
            set.insert(StarName::parse(part)?);
        }
        Ok(set)
    }
}

impl FromIterator<StarName> for AliasSet {
    fn from_iter<I: IntoIterator<Item = StarName>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<StarName> for AliasSet {
    fn extend<I: IntoIterator<Item = StarName>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl fmt::Display for AliasSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
