//! Physical parameters for a star, by any of its names.
//!
//! The name is resolved to its alias set first; each Gaia alias is then
//! looked up in the cache for its release, and fetched from the archive on a
//! miss. Fetched rows, including empty ones, are written to the cache before
//! they are used.

use super::cache::{ParamCache, ParamEntry};
use super::normalize::Normalizer;
use super::row::ParamRow;
use super::value::ParamSet;
use crate::config::XrefConfig;
use crate::error::{XrefError, XrefResult};
use crate::identity::{IdentityResolver, DEFAULT_MAX_ATTEMPTS};
use crate::names::{AliasSet, GaiaRelease, IntoStarName, StarName};
use crate::remote::{AliasQuery, GaiaClient, ParamQuery, SimbadClient};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

pub struct ParamResolver<A, P> {
    identity: IdentityResolver<A>,
    remote: P,
    caches: BTreeMap<GaiaRelease, ParamCache>,
    normalizer: Normalizer,
    max_attempts: usize,
    remote_queries: usize,
}

impl ParamResolver<SimbadClient, GaiaClient> {
    /// Resolver over the configured reference directory, backed by SIMBAD
    /// and the Gaia archive.
    pub fn from_config(config: &XrefConfig) -> XrefResult<Self> {
        let identity = IdentityResolver::from_config(config)?;
        let remote = GaiaClient::from_config(config)?;
        let caches = config
            .releases()?
            .into_iter()
            .map(|release| (release, ParamCache::with_path(release, config.param_path(release))))
            .collect();
        Ok(Self::with_caches(identity, remote, caches)
            .with_normalizer(Normalizer::from_config(config)?)
            .with_max_attempts(config.max_resolve_attempts))
    }
}

impl<A: AliasQuery, P: ParamQuery> ParamResolver<A, P> {
    /// One cache per release in `releases`, stored in `reference_dir`.
    pub fn new(
        identity: IdentityResolver<A>,
        remote: P,
        reference_dir: impl AsRef<Path>,
        releases: &[GaiaRelease],
    ) -> Self {
        let caches = releases
            .iter()
            .map(|&release| (release, ParamCache::new(release, reference_dir.as_ref())))
            .collect();
        Self::with_caches(identity, remote, caches)
    }

    fn with_caches(
        identity: IdentityResolver<A>,
        remote: P,
        caches: BTreeMap<GaiaRelease, ParamCache>,
    ) -> Self {
        Self {
            identity,
            remote,
            caches,
            normalizer: Normalizer::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            remote_queries: 0,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn identity(&self) -> &IdentityResolver<A> {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut IdentityResolver<A> {
        &mut self.identity
    }

    pub fn remote(&self) -> &P {
        &self.remote
    }

    /// Remote parameter queries sent by this resolver.
    pub fn remote_queries(&self) -> usize {
        self.remote_queries
    }

    pub fn releases(&self) -> impl Iterator<Item = GaiaRelease> + '_ {
        self.caches.keys().copied()
    }

    pub fn cache(&self, release: GaiaRelease) -> Option<&ParamCache> {
        self.caches.get(&release)
    }

    pub fn cache_mut(&mut self, release: GaiaRelease) -> Option<&mut ParamCache> {
        self.caches.get_mut(&release)
    }

    /// Raw measurements for every Gaia alias of `name`, keyed by that alias.
    pub fn get_rows(
        &mut self,
        name: impl IntoStarName,
    ) -> XrefResult<BTreeMap<StarName, Vec<ParamRow>>> {
        let aliases = self.identity.resolve(name)?;
        self.rows_for(&aliases)
    }

    pub fn get_rows_for_aliases(
        &mut self,
        partial: &AliasSet,
    ) -> XrefResult<BTreeMap<StarName, Vec<ParamRow>>> {
        let aliases = self.identity.resolve_aliases(partial)?;
        self.rows_for(&aliases)
    }

    /// Normalized parameters from every served Gaia release.
    pub fn get_params(&mut self, name: impl IntoStarName) -> XrefResult<ParamSet> {
        let rows = self.get_rows(name)?;
        Ok(self.normalize_rows(&rows))
    }

    pub fn get_params_for_aliases(&mut self, partial: &AliasSet) -> XrefResult<ParamSet> {
        let rows = self.get_rows_for_aliases(partial)?;
        Ok(self.normalize_rows(&rows))
    }

    /// Fetches every id in `ids` not yet cached for `release` in one remote
    /// call and caches the results. Returns how many ids were added.
    pub fn batch_update(&mut self, release: GaiaRelease, ids: &[String]) -> XrefResult<usize> {
        let cache = self
            .caches
            .get_mut(&release)
            .ok_or_else(|| not_served(release))?;

        let mut missing = BTreeSet::new();
        for id in ids {
            if !cache.contains(id)? {
                missing.insert(id.clone());
            }
        }
        if missing.is_empty() {
            debug!(release = %release, "every requested id is already cached");
            return Ok(0);
        }

        let missing: Vec<String> = missing.into_iter().collect();
        self.remote_queries += 1;
        let mut fetched = self.remote.query_params(release, &missing)?;
        let mut found = 0;
        for id in &missing {
            let row = fetched.remove(id).unwrap_or_default();
            if !row.is_empty() {
                found += 1;
            }
            cache.add(ParamEntry::new([id.as_str()], row))?;
        }
        cache.save()?;
        cache.load()?;
        info!(
            release = %release,
            requested = missing.len(),
            found,
            "batch update written to the parameter cache"
        );
        Ok(missing.len())
    }

    /// [`batch_update`](Self::batch_update) over every id of `release`
    /// already named in the alias store.
    pub fn batch_update_known(&mut self, release: GaiaRelease) -> XrefResult<usize> {
        let ids: Vec<String> = self
            .identity
            .store_mut()
            .known_ids(release.catalog_type())?
            .into_iter()
            .collect();
        self.batch_update(release, &ids)
    }

    fn rows_for(
        &mut self,
        aliases: &AliasSet,
    ) -> XrefResult<BTreeMap<StarName, Vec<ParamRow>>> {
        let mut rows = BTreeMap::new();
        for name in aliases.gaia_names() {
            let Some(release) = name.catalog.gaia_release() else {
                continue;
            };
            if !self.caches.contains_key(&release) {
                debug!(name = %name, "release not served, skipping");
                continue;
            }
            let measurements = self.fetch_rows(release, &name.id)?;
            rows.insert(name, measurements);
        }
        Ok(rows)
    }

    fn fetch_rows(&mut self, release: GaiaRelease, id: &str) -> XrefResult<Vec<ParamRow>> {
        for _ in 0..self.max_attempts {
            let cache = self
                .caches
                .get_mut(&release)
                .ok_or_else(|| not_served(release))?;
            if let Some(rows) = cache.find(id)? {
                return Ok(rows.to_vec());
            }

            self.remote_queries += 1;
            let mut fetched = self.remote.query_params(release, &[id.to_string()])?;
            let row = fetched.remove(id).unwrap_or_default();
            if row.is_empty() {
                info!(
                    release = %release,
                    id,
                    "no parameters in the archive, caching the empty result"
                );
            }
            cache.add(ParamEntry::new([id], row))?;
            cache.save()?;
            cache.load()?;
        }
        Err(XrefError::RetryLimit {
            name: format!("{} {}", release.catalog_type().tag(), id),
            attempts: self.max_attempts,
        })
    }

    fn normalize_rows(&self, rows: &BTreeMap<StarName, Vec<ParamRow>>) -> ParamSet {
        let mut params = ParamSet::new();
        for (name, measurements) in rows {
            if let Some(release) = name.catalog.gaia_release() {
                params.union(&self.normalizer.normalize_all(release, measurements));
            }
        }
        params
    }
}

fn not_served(release: GaiaRelease) -> XrefError {
    XrefError::Config(format!("Gaia {} is not among the served releases", release))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AliasStore, ALIAS_FILE_NAME};

    struct NoAliases;

    impl AliasQuery for NoAliases {
        fn query_aliases(&mut self, _name: &StarName) -> XrefResult<Vec<Vec<String>>> {
            Ok(Vec::new())
        }
    }

    /// Archive holding a parallax for every id below 1000.
    #[derive(Default)]
    struct FakeArchive {
        batches: Vec<Vec<String>>,
    }

    impl ParamQuery for FakeArchive {
        fn query_params(
            &mut self,
            _release: GaiaRelease,
            ids: &[String],
        ) -> XrefResult<BTreeMap<String, ParamRow>> {
            self.batches.push(ids.to_vec());
            Ok(ids
                .iter()
                .filter(|id| id.parse::<u32>().is_ok_and(|n| n < 1000))
                .map(|id| {
                    let row = [("parallax".to_string(), format!("{}.0", id))]
                        .into_iter()
                        .collect();
                    (id.clone(), row)
                })
                .collect())
        }
    }

    fn resolver(dir: &Path) -> ParamResolver<NoAliases, FakeArchive> {
        let store = AliasStore::open(dir.join(ALIAS_FILE_NAME)).unwrap();
        ParamResolver::new(
            IdentityResolver::new(store, NoAliases),
            FakeArchive::default(),
            dir,
            &[GaiaRelease::Dr2],
        )
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_batch_update_skips_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver(dir.path());
        let added = resolver.batch_update(GaiaRelease::Dr2, &ids(&["5", "6", "5000"]));
        assert_eq!(added.unwrap(), 3);
        let added = resolver.batch_update(GaiaRelease::Dr2, &ids(&["5", "7"]));
        assert_eq!(added.unwrap(), 1);
        assert_eq!(
            resolver.remote().batches,
            vec![ids(&["5", "5000", "6"]), ids(&["7"])]
        );

        let cache = resolver.cache(GaiaRelease::Dr2).unwrap();
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.empty_count(), 1);
    }

    #[test]
    fn test_batch_update_unserved_release() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver(dir.path());
        assert!(matches!(
            resolver.batch_update(GaiaRelease::Dr1, &ids(&["1"])),
            Err(XrefError::Config(_))
        ));
    }

    #[test]
    fn test_gaia_name_resolved_directly() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver(dir.path());
        let rows = resolver.get_rows("Gaia DR2 12").unwrap();
        let name = StarName::parse("Gaia DR2 12").unwrap();
        assert_eq!(rows[&name][0].get("parallax"), Some("12.0"));
        resolver.get_rows("Gaia DR2 12").unwrap();
        assert_eq!(resolver.remote_queries(), 1);
    }

    #[test]
    fn test_unserved_release_alias_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver(dir.path());
        assert!(resolver.get_params("Gaia DR1 12").unwrap().is_empty());
        assert_eq!(resolver.remote_queries(), 0);
    }
}
