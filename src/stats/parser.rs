//! Generic traits for parsing kernel statistics sources into structured types.
//!
//! - [`KeyValueStat`]: multi-line sources with one `key value [unit]` pair per line,
//!   such as `/proc/meminfo` or cgroup `cpu.stat`.
//! - [`SingleLineStat`]: sources where one line carries all the interesting data,
//!   such as the aggregate `cpu` line of `/proc/stat`.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use vitals_glimpse::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Pressure {
//!     some: u64,
//! }
//!
//! type Setter = fn(&mut Pressure, u64);
//!
//! static SETTERS: LazyLock<HashMap<&'static str, Setter>> =
//!     LazyLock::new(|| HashMap::from([("some", (|p: &mut Pressure, v: u64| p.some = v) as Setter)]));
//!
//! impl KeyValueStat for Pressure {
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, Setter> {
//!         &SETTERS
//!     }
//! }
//!
//! let stat = Pressure::from_reader(&mut "other 1\nsome 7\n".as_bytes()).unwrap();
//! assert_eq!(stat.some, 7);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// A trait for parsing whitespace-separated `key value` files.
///
/// Only the first pair of each line is considered; trailing tokens such as the `kB`
/// unit in `/proc/meminfo` are ignored. Keys without a handler are skipped.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `false`, encountering the same known key twice is an error, and parsing stops
    /// as soon as every known key has been seen.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Returns the known field names and the setters applying parsed values to `Self`.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses a key-value formatted buffer into `Self`.
    ///
    /// # Errors
    /// Returns an `io::Error` if reading fails, or a [`StatParseError`] wrapped in
    /// `io::Error` if a known key carries an invalid value or is duplicated.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                Self::parse_and_set(key, val, &mut stat, lineno, handlers, &mut seen_keys)?;
            }
            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == handlers.len() {
                break;
            }

            line.clear();
        }

        Ok(stat)
    }

    /// Parses a single key-value pair and applies it through the matching handler.
    ///
    /// # Errors
    /// Returns [`StatParseError::InvalidKeyValue`] if the value is not a `u64`,
    /// or [`StatParseError::DuplicateField`] for a disallowed repeated key.
    fn parse_and_set(
        key: &str,
        val: &str,
        stat: &mut Self,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> std::io::Result<()> {
        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Self::on_unknown_key(key, val, lineno);
        };

        let parsed = val
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: key.to_string(),
                value: val.to_string(),
                line: lineno,
                source,
            })?;
        if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(*k) {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            }
            .into());
        }
        handler(stat, parsed);
        Ok(())
    }

    /// Called for keys without a handler. Ignores them by default.
    #[inline]
    fn on_unknown_key(_key: &str, _val: &str, _lineno: usize) -> std::io::Result<()> {
        Ok(())
    }
}

/// A trait for sources whose useful content sits on a single line.
pub trait SingleLineStat: Sized + Default {
    /// Parses the statistic from the provided buffered reader.
    ///
    /// # Errors
    ///
    /// Returns `Err(std::io::Error)` if reading or parsing fails.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;
}
