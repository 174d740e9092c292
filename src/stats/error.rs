//! Structured error types for parsing kernel statistics sources.
//!
//! [`StatParseError`] converts into [`std::io::Error`] with kind `InvalidData`, so the
//! parsers can keep plain `io::Result` signatures. Tests recover the structured error
//! with [`extract_stat_parse_error`].

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("field `{field}` repeated at line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("line {line}: `{key}` has non-numeric value `{value}`: {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("field `{field}` missing at line {line}")]
    MissingField { field: &'static str, line: usize },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StatParseError> for std::io::Error {
    fn from(err: StatParseError) -> Self {
        match err {
            StatParseError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}

/// Recovers the [`StatParseError`] carried by an `io::Error`. Panics on any other error.
#[cfg(test)]
pub(super) fn extract_stat_parse_error(err: &std::io::Error) -> &StatParseError {
    err.get_ref()
        .and_then(|e| e.downcast_ref::<StatParseError>())
        .unwrap()
}
