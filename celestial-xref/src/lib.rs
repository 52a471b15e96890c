//! Persistent cross-catalog identity resolution for stars.
//!
//! A star is known under many names: `HD 128620`, `HIP 71683`,
//! `Gaia DR2 5853498713190525696`. This crate resolves any of them to the
//! full set of aliases and caches the answer in plain reference files, so the
//! rate-limited remote catalogs are asked about each star at most once.
//! Physical parameters from the Gaia releases are cached on the same identity
//! model and normalized on the way out.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`names`] | [`CatalogType`](names::CatalogType) preference order, [`StarName`](names::StarName) parsing, [`AliasSet`](names::AliasSet) and canonical names |
//! | [`index`] | [`LookupIndex`](index::LookupIndex): claim index with duplicate merging, shared by every store |
//! | [`identity`] | [`AliasStore`](identity::AliasStore), [`BadNameList`](identity::BadNameList), [`IdentityResolver`](identity::IdentityResolver) |
//! | [`params`] | [`ParamCache`](params::ParamCache) per Gaia release, [`Normalizer`](params::Normalizer), [`ParamResolver`](params::ParamResolver) |
//! | [`remote`] | [`AliasQuery`](remote::AliasQuery) / [`ParamQuery`](remote::ParamQuery) seams, SIMBAD and Gaia TAP clients with position lookup and cone search, rate limiting |
//! | [`config`] | [`XrefConfig`](config::XrefConfig), [`XrefBuilder`](config::XrefBuilder) |
//! | [`error`] | [`XrefError`](error::XrefError), [`XrefResult`](error::XrefResult) |
//!
//! # Quick Start
//!
//! ```ignore
//! use celestial_xref::{ParamResolver, XrefConfig};
//!
//! let config = XrefConfig::builder().with_reference_dir("reference_data").build()?;
//! let mut resolver = ParamResolver::from_config(&config)?;
//!
//! let aliases = resolver.identity_mut().resolve("HD 128620")?;
//! println!("{} is {}", aliases, aliases.canonical_name()?);
//!
//! let params = resolver.get_params("HIP 71683")?;
//! for record in params.get("dist") {
//!     println!("dist = {} {}", record.value, record.units.as_deref().unwrap_or(""));
//! }
//! ```
//!
//! # Reference Files
//!
//! - `simbad_ref_data.txt`: one star per line, `|`-joined aliases
//! - `GaiaDR{n}_ref.csv`: one row per Gaia source, `name` then raw fields
//! - `bad_starname_ignore.csv`: `name,reason` rows never sent to SIMBAD
//!
//! Files are rewritten whole through a temporary file and a rename.
//!
//! # Features
//!
//! - **`cli`**: Enables the `xref` binary for resolving names and
//!   maintaining the reference files from the command line.

pub mod config;
pub mod error;
pub mod identity;
pub mod index;
pub mod names;
pub mod params;
mod persist;
pub mod remote;

pub use config::{XrefBuilder, XrefConfig};
pub use error::{XrefError, XrefResult};
pub use identity::{AliasStore, BadNameList, IdentityResolver};
pub use names::{AliasSet, CatalogType, GaiaRelease, IntoStarName, StarName};
pub use params::{ParamCache, ParamRecord, ParamResolver, ParamRow, ParamSet, ParamValue};
pub use remote::{AliasQuery, GaiaClient, ParamQuery, SimbadClient, SkyPosition};
