//! Gaia physical parameters layered on the identity model.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`row`] | [`ParamRow`], one raw provider measurement |
//! | [`value`] | [`ParamValue`], [`ParamRecord`], [`ParamSet`] |
//! | [`cache`] | [`ParamCache`], one CSV reference file per release |
//! | [`normalize`] | parallax offset, distance, error pairing, units |
//! | [`resolver`] | [`ParamResolver`], name → parameters |

pub mod cache;
pub mod normalize;
pub mod resolver;
pub mod row;
pub mod value;

pub use cache::{ParamCache, ParamEntry};
pub use normalize::Normalizer;
pub use resolver::ParamResolver;
pub use row::ParamRow;
pub use value::{ParamRecord, ParamSet, ParamValue};
