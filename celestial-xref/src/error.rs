//! Error type for identity resolution and parameter caching.
//!
//! | Variant | Raised by | Recoverable? |
//! |---------|-----------|--------------|
//! | [`MalformedName`](XrefError::MalformedName) | name parsing | No, fix the input |
//! | [`UnknownCatalogType`](XrefError::UnknownCatalogType) | name parsing | Remote aliases are dropped instead |
//! | [`ProviderMismatch`](XrefError::ProviderMismatch) | parameter cache load | No, file is corrupt or misplaced |
//! | [`MalformedRecord`](XrefError::MalformedRecord) | reference file load | No |
//! | [`InvariantViolation`](XrefError::InvariantViolation) | canonical naming | No, programming defect |
//! | [`RetryLimit`](XrefError::RetryLimit) | resolvers | No |
//! | [`EmptyQuery`](XrefError::EmptyQuery) | partial-alias resolution | No |
//! | [`InvalidQuery`](XrefError::InvalidQuery) | positional queries | No, fix the input |
//! | [`Remote`](XrefError::Remote) | HTTP clients | Yes |
//! | [`Io`](XrefError::Io), [`Csv`](XrefError::Csv), [`Config`](XrefError::Config) | persistence, config | Sometimes |
//!
//! A name that the remote catalogs do not know is not an error: the miss is
//! cached as a negative result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XrefError {
    /// A name string could not be split into a catalog tag and an identifier.
    #[error("Malformed star name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    /// The catalog tag is outside the accepted preference ordering.
    #[error("Unknown catalog type in star name '{name}'")]
    UnknownCatalogType { name: String },

    /// A parameter row carries a name from a different provider than the cache reading it.
    #[error("Provider mismatch in {path:?}: expected {expected}, found {found}")]
    ProviderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A line or row of a reference file could not be decoded.
    #[error("Malformed record in {path:?} at line {line}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// An internal invariant was broken.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A resolution loop did not settle within its attempt budget.
    #[error("Resolution of '{name}' did not settle after {attempts} attempts")]
    RetryLimit { name: String, attempts: usize },

    #[error("Alias query was empty")]
    EmptyQuery,

    /// Query arguments outside their valid range.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Remote catalog service failure (network, HTTP status, TAP job state).
    #[error("Remote error ({service} - {operation}): {message}")]
    Remote {
        service: String,
        operation: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type XrefResult<T> = Result<T, XrefError>;

impl XrefError {
    pub fn malformed_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_catalog_type(name: impl Into<String>) -> Self {
        Self::UnknownCatalogType { name: name.into() }
    }

    pub fn malformed_record(
        path: impl Into<PathBuf>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn remote(service: &str, operation: &str, message: impl Into<String>) -> Self {
        Self::Remote {
            service: service.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` if retrying later might succeed.
    ///
    /// Only remote failures are transient; everything else reflects bad input,
    /// bad files or a defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_name_message() {
        let err = XrefError::malformed_name("HD", "missing identifier");
        assert_eq!(
            err.to_string(),
            "Malformed star name 'HD': missing identifier"
        );
    }

    #[test]
    fn test_provider_mismatch_message() {
        let err = XrefError::ProviderMismatch {
            path: PathBuf::from("GaiaDR2_ref.csv"),
            expected: "gaia dr2".to_string(),
            found: "gaia dr1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected gaia dr2"));
        assert!(msg.contains("found gaia dr1"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(XrefError::remote("SIMBAD", "query", "timeout").is_recoverable());
        assert!(!XrefError::EmptyQuery.is_recoverable());
        assert!(!XrefError::InvariantViolation("empty alias set".into()).is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: XrefError = io.into();
        assert!(matches!(err, XrefError::Io(_)));
    }

    #[test]
    fn test_send_sync() {
        fn _assert_send<T: Send>() {}
        fn _assert_sync<T: Sync>() {}
        _assert_send::<XrefError>();
        _assert_sync::<XrefError>();
    }
}
