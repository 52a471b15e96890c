//! Claim index shared by the alias store and the parameter caches.
//!
//! Every record in a store claims a set of keys. [`LookupIndex::rebuild`]
//! walks the records in order and hands each key to the first record that
//! claims it. When a later record claims a key that is already taken, the two
//! records describe the same star: the later one is folded into the first,
//! removed, and the scan restarts on the shorter list. The store shrinks on
//! every restart, so the rebuild terminates, and the finished index maps each
//! key to exactly one record.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::info;

/// A stored record that claims lookup keys and can absorb a duplicate of itself.
pub trait Claims {
    type Key: Clone + Eq + Hash + fmt::Display;

    fn claim_keys(&self) -> Vec<Self::Key>;

    /// Folds `other` into `self`. Must only grow `self`.
    fn absorb(&mut self, other: Self);

    /// Short human-readable form, used when logging merges.
    fn describe(&self) -> String;
}

struct DuplicateClaim<K> {
    key: K,
    first: usize,
    later: usize,
}

/// Key → record position, derived from a store's records.
///
/// Positions are only meaningful for the record list the index was built
/// from; any change to that list requires a rebuild.
#[derive(Debug, Clone)]
pub struct LookupIndex<K> {
    claims: HashMap<K, usize>,
    merges: usize,
}

impl<K: Clone + Eq + Hash + fmt::Display> LookupIndex<K> {
    /// Builds the index, merging records with overlapping claims in place.
    pub fn rebuild<R: Claims<Key = K>>(records: &mut Vec<R>) -> Self {
        let mut merges = 0;
        loop {
            match Self::scan(records) {
                Ok(claims) => return Self { claims, merges },
                Err(duplicate) => {
                    let later = records.remove(duplicate.later);
                    info!(
                        key = %duplicate.key,
                        kept = %records[duplicate.first].describe(),
                        merged = %later.describe(),
                        "duplicate claim found, merging records and rebuilding the index"
                    );
                    records[duplicate.first].absorb(later);
                    merges += 1;
                }
            }
        }
    }

    fn scan<R: Claims<Key = K>>(records: &[R]) -> Result<HashMap<K, usize>, DuplicateClaim<K>> {
        let mut claims = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            for key in record.claim_keys() {
                match claims.get(&key) {
                    Some(&owner) if owner != index => {
                        return Err(DuplicateClaim {
                            key,
                            first: owner,
                            later: index,
                        });
                    }
                    Some(_) => {}
                    None => {
                        claims.insert(key, index);
                    }
                }
            }
        }
        Ok(claims)
    }

    pub fn get(&self, key: &K) -> Option<usize> {
        self.claims.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.claims.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.claims.keys()
    }

    /// Number of claimed keys.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// How many duplicate records were merged while building this index.
    pub fn merges(&self) -> usize {
        self.merges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Tagged(BTreeSet<u32>);

    impl Tagged {
        fn of(keys: &[u32]) -> Self {
            Self(keys.iter().copied().collect())
        }
    }

    impl Claims for Tagged {
        type Key = u32;

        fn claim_keys(&self) -> Vec<u32> {
            self.0.iter().copied().collect()
        }

        fn absorb(&mut self, other: Self) {
            self.0.extend(other.0);
        }

        fn describe(&self) -> String {
            format!("{:?}", self.0)
        }
    }

    #[test]
    fn test_disjoint_records_untouched() {
        let mut records = vec![Tagged::of(&[1, 2]), Tagged::of(&[3])];
        let index = LookupIndex::rebuild(&mut records);
        assert_eq!(records.len(), 2);
        assert_eq!(index.get(&1), Some(0));
        assert_eq!(index.get(&3), Some(1));
        assert_eq!(index.get(&9), None);
        assert_eq!(index.merges(), 0);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_duplicate_merged_into_first_seen() {
        let mut records = vec![Tagged::of(&[1, 2]), Tagged::of(&[5]), Tagged::of(&[2, 7])];
        let index = LookupIndex::rebuild(&mut records);
        assert_eq!(records, vec![Tagged::of(&[1, 2, 7]), Tagged::of(&[5])]);
        assert_eq!(index.get(&7), Some(0));
        assert_eq!(index.get(&5), Some(1));
        assert_eq!(index.merges(), 1);
    }

    #[test]
    fn test_transitive_chain_collapses() {
        let mut records = vec![
            Tagged::of(&[1]),
            Tagged::of(&[2]),
            Tagged::of(&[1, 3]),
            Tagged::of(&[3, 2]),
        ];
        let index = LookupIndex::rebuild(&mut records);
        assert_eq!(records, vec![Tagged::of(&[1, 2, 3])]);
        for key in [1, 2, 3] {
            assert_eq!(index.get(&key), Some(0));
        }
        assert_eq!(index.merges(), 3);
    }

    #[test]
    fn test_every_key_maps_to_a_record_holding_it() {
        let mut records = vec![
            Tagged::of(&[10, 11]),
            Tagged::of(&[12]),
            Tagged::of(&[11, 13]),
            Tagged::of(&[14, 12]),
            Tagged::of(&[15]),
        ];
        let index = LookupIndex::rebuild(&mut records);
        for key in index.keys() {
            let owner = index.get(key).unwrap();
            assert!(records[owner].0.contains(key));
        }
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_empty_store() {
        let mut records: Vec<Tagged> = Vec::new();
        let index = LookupIndex::rebuild(&mut records);
        assert!(index.is_empty());
    }
}
