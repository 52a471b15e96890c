//! Remote catalog collaborators.
//!
//! The resolvers only see the two query traits below. [`SimbadClient`] and
//! [`GaiaClient`] implement them over HTTP against the public TAP services;
//! tests substitute in-memory fakes.

pub mod gaia;
pub mod rate_limit;
pub mod simbad;

pub use gaia::{GaiaClient, GAIA_TAP_URL, MAX_BATCH};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use simbad::{SimbadClient, SkyPosition, SIMBAD_TAP_URL};

use crate::error::XrefResult;
use crate::names::{GaiaRelease, StarName};
use crate::params::ParamRow;
use std::collections::BTreeMap;

pub(crate) fn user_agent() -> String {
    format!("celestial-xref/{}", env!("CARGO_PKG_VERSION"))
}

/// Source of cross-identifications.
pub trait AliasQuery {
    /// Raw alias strings for every object matching `name`, one list per
    /// object. An empty result means the catalog does not know the name.
    fn query_aliases(&mut self, name: &StarName) -> XrefResult<Vec<Vec<String>>>;
}

/// Source of physical parameters for one Gaia release.
pub trait ParamQuery {
    /// Rows keyed by source id. Ids the catalog does not hold are absent.
    fn query_params(
        &mut self,
        release: GaiaRelease,
        ids: &[String],
    ) -> XrefResult<BTreeMap<String, ParamRow>>;
}

impl<T: AliasQuery + ?Sized> AliasQuery for &mut T {
    fn query_aliases(&mut self, name: &StarName) -> XrefResult<Vec<Vec<String>>> {
        (**self).query_aliases(name)
    }
}

impl<T: AliasQuery + ?Sized> AliasQuery for Box<T> {
    fn query_aliases(&mut self, name: &StarName) -> XrefResult<Vec<Vec<String>>> {
        (**self).query_aliases(name)
    }
}

impl<T: ParamQuery + ?Sized> ParamQuery for &mut T {
    fn query_params(
        &mut self,
        release: GaiaRelease,
        ids: &[String],
    ) -> XrefResult<BTreeMap<String, ParamRow>> {
        (**self).query_params(release, ids)
    }
}

impl<T: ParamQuery + ?Sized> ParamQuery for Box<T> {
    fn query_params(
        &mut self,
        release: GaiaRelease,
        ids: &[String],
    ) -> XrefResult<BTreeMap<String, ParamRow>> {
        (**self).query_params(release, ids)
    }
}
