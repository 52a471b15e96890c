//! Star names and alias sets.
//!
//! - [`catalog`]: the closed set of accepted catalog types, in preference order, and the Gaia releases
//! - [`star_name`]: one `(catalog type, id)` pair, its text and handle forms
//! - [`alias_set`]: every alias of one star, canonical-name selection, line serialization

pub mod alias_set;
pub mod catalog;
pub mod star_name;

pub use alias_set::{AliasSet, ALIAS_DELIMITER};
pub use catalog::{CatalogType, GaiaRelease};
pub use star_name::{IntoStarName, StarName};
