//! Field-keyed validation helpers.
//!
//! Errors are keyed by a dotted field path (`storage.dsn`, `origins.2`). Only
//! the first message recorded for a key is kept.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;

/// Loose RFC 5322 address check used for customer contact fields.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Collects validation failures keyed by field path.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` under `key` unless the key already has an error.
    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_insert_with(|| message.into());
    }

    /// Record `message` under `key` when `ok` is false.
    pub fn check(&mut self, ok: bool, key: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add_error(key, message);
        }
    }

    /// Scope subsequent checks under `prefix`.
    pub fn envelope(&mut self, prefix: impl Into<String>) -> Envelope<'_> {
        Envelope {
            validator: self,
            prefix: prefix.into(),
        }
    }

    /// Scope subsequent checks under `key.index`.
    pub fn array_envelope(&mut self, key: &str, index: usize) -> Envelope<'_> {
        self.envelope(format!("{key}.{index}"))
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Convert into a result, failing when any error was recorded.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// A prefixed view onto a [`Validator`].
#[derive(Debug)]
pub struct Envelope<'a> {
    validator: &'a mut Validator,
    prefix: String,
}

impl Envelope<'_> {
    pub fn check(&mut self, ok: bool, key: &str, message: impl Into<String>) {
        let full_key = if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.prefix)
        };
        self.validator.check(ok, full_key, message);
    }

    /// Nest a further prefix under this one.
    pub fn envelope(&mut self, prefix: &str) -> Envelope<'_> {
        let prefix = if self.prefix.is_empty() {
            prefix.to_string()
        } else {
            format!("{}.{prefix}", self.prefix)
        };
        Envelope {
            validator: self.validator,
            prefix,
        }
    }
}

/// All failures from one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub BTreeMap<String, String>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: ")?;
        for (i, (key, message)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// True when `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True when `value` matches `pattern`.
pub fn matches(value: &str, pattern: &Regex) -> bool {
    pattern.is_match(value)
}

/// True when no value appears twice.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(value))
}
