//! Star identity resolution.
//!
//! - [`alias_store`]: the alias reference file and its lookup index
//! - [`bad_names`]: names known to have no remote data
//! - [`resolver`]: lookup, remote fallback and persistence for one name or a partial alias set

pub mod alias_store;
pub mod bad_names;
pub mod resolver;

pub use alias_store::{AliasStore, ALIAS_FILE_NAME};
pub use bad_names::{BadNameList, BAD_NAMES_FILE_NAME};
pub use resolver::{IdentityResolver, DEFAULT_MAX_ATTEMPTS};
