//! Lookup-or-query-or-record for star identities.
//!
//! [`IdentityResolver::resolve`] answers from, in order: the session lookup
//! (sets already resolved since the store last changed), the alias store,
//! and finally the remote alias catalog. Whatever the remote says, including
//! "unknown", is written to the store before the answer is returned, so the
//! remote is asked about a name at most once.

use super::alias_store::AliasStore;
use super::bad_names::BadNameList;
use crate::config::XrefConfig;
use crate::error::{XrefError, XrefResult};
use crate::names::{AliasSet, IntoStarName, StarName};
use crate::remote::{AliasQuery, SimbadClient};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ATTEMPTS: usize = 8;

/// Alias sets resolved since the store was last rewritten.
#[derive(Debug, Default)]
struct SessionLookup {
    sets: Vec<AliasSet>,
    owners: HashMap<StarName, usize>,
}

impl SessionLookup {
    fn get(&self, name: &StarName) -> Option<&AliasSet> {
        self.owners.get(name).and_then(|&i| self.sets.get(i))
    }

    fn register(&mut self, set: AliasSet) {
        let position = self.sets.len();
        for name in set.names() {
            self.owners.insert(name, position);
        }
        self.sets.push(set);
    }

    fn clear(&mut self) {
        self.sets.clear();
        self.owners.clear();
    }
}

pub struct IdentityResolver<A> {
    store: AliasStore,
    remote: A,
    bad_names: BadNameList,
    check_bad_names: bool,
    max_attempts: usize,
    session: SessionLookup,
    remote_queries: usize,
}

impl IdentityResolver<SimbadClient> {
    /// Resolver over the configured reference directory, backed by SIMBAD.
    pub fn from_config(config: &XrefConfig) -> XrefResult<Self> {
        let store = AliasStore::open(config.alias_path())?;
        let bad_names = BadNameList::load(config.bad_names_path())?;
        Ok(Self::new(store, SimbadClient::from_config(config)?)
            .with_bad_names(bad_names)
            .with_check_bad_names(config.check_bad_names)
            .with_max_attempts(config.max_resolve_attempts))
    }
}

impl<A: AliasQuery> IdentityResolver<A> {
    pub fn new(store: AliasStore, remote: A) -> Self {
        Self {
            store,
            remote,
            bad_names: BadNameList::new(),
            check_bad_names: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            session: SessionLookup::default(),
            remote_queries: 0,
        }
    }

    pub fn with_bad_names(mut self, bad_names: BadNameList) -> Self {
        self.bad_names = bad_names;
        self
    }

    /// Query the remote even for names on the bad-name list.
    pub fn with_check_bad_names(mut self, check: bool) -> Self {
        self.check_bad_names = check;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &AliasStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AliasStore {
        &mut self.store
    }

    pub fn remote(&self) -> &A {
        &self.remote
    }

    pub fn bad_names(&self) -> &BadNameList {
        &self.bad_names
    }

    /// Remote alias queries sent by this resolver.
    pub fn remote_queries(&self) -> usize {
        self.remote_queries
    }

    /// Every alias of the star `name` refers to.
    ///
    /// A name neither the store nor the remote knows comes back as a set
    /// holding just that name, and is remembered as such.
    pub fn resolve(&mut self, name: impl IntoStarName) -> XrefResult<AliasSet> {
        let name = name.into_star_name()?;
        for _ in 0..self.max_attempts {
            if let Some(set) = self.session.get(&name) {
                return Ok(set.clone());
            }

            if let Some(set) = self.store.find(&name)? {
                let set = set.clone();
                self.session.register(set.clone());
                return Ok(set);
            }

            let found = if self.check_bad_names || !self.bad_names.contains(&name) {
                self.query_remote(&name)?
            } else {
                Vec::new()
            };
            if found.is_empty() {
                self.report_miss(&name);
                self.store.add([AliasSet::singleton(name.clone())])?;
            } else {
                info!(name = %name, records = found.len(), "new reference data found");
                self.store.add(found)?;
            }
            self.persist()?;
        }
        Err(XrefError::RetryLimit {
            name: name.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Resolves a star known by several aliases at once.
    ///
    /// When the aliases are spread over different records, or some are not
    /// on file yet, everything they resolve to is linked into one record.
    pub fn resolve_aliases(&mut self, partial: &AliasSet) -> XrefResult<AliasSet> {
        let names: Vec<StarName> = partial.names().collect();
        let Some(first) = names.first().cloned() else {
            return Err(XrefError::EmptyQuery);
        };

        let mut found = Vec::new();
        let mut unfound = Vec::new();
        for name in names {
            if self.store.contains(&name)? {
                found.push(name);
            } else {
                unfound.push(name);
            }
        }

        if unfound.is_empty() {
            let owner = self.resolve(&found[0])?;
            if partial.names().all(|name| owner.contains(&name)) {
                return Ok(owner);
            }
        }

        let mut linked = partial.clone();
        for name in &found {
            if let Some(set) = self.store.find(name)? {
                linked.union(set);
            }
        }
        for name in &unfound {
            let set = self.resolve(name)?;
            linked.union(&set);
        }
        debug!(aliases = %linked, "linking aliases into one record");
        self.store.add([linked])?;
        self.persist()?;
        self.resolve(first)
    }

    /// Remote alias sets for `name`, each extended with `name` itself.
    /// Alias strings that do not parse are dropped.
    fn query_remote(&mut self, name: &StarName) -> XrefResult<Vec<AliasSet>> {
        self.remote_queries += 1;
        let raw = self.remote.query_aliases(name)?;
        let mut sets = Vec::with_capacity(raw.len());
        for aliases in raw {
            let mut set = AliasSet::new();
            for alias in &aliases {
                match StarName::parse(alias) {
                    Ok(parsed) => {
                        set.insert(parsed);
                    }
                    Err(XrefError::UnknownCatalogType { .. }) => {
                        debug!(alias = %alias, "dropping alias from an unused catalog");
                    }
                    Err(e) => info!(alias = %alias, "dropping malformed remote alias: {e}"),
                }
            }
            if !set.is_empty() {
                set.insert(name.clone());
                sets.push(set);
            }
        }
        Ok(sets)
    }

    fn report_miss(&self, name: &StarName) {
        match self.bad_names.reason(name) {
            Some(reason) => {
                info!(name = %name, reason, "known bad star name, recording it alone")
            }
            None => warn!(
                name = %name,
                "star name not found in the reference catalog, recording it alone"
            ),
        }
    }

    /// Rewrites the store and reloads it, dropping every cached position.
    fn persist(&mut self) -> XrefResult<()> {
        self.store.save()?;
        self.store.load()?;
        self.session.clear();
        Ok(())
    }
}
