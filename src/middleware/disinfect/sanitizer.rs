//! Pluggable sanitizer slots.
//!
//! A sanitizer receives a whole surface mapping and returns the mapping the
//! next pass should use. It may rewrite values or drop keys; it should not
//! add keys.
//!
//! Any `Fn(KeyValueMap) -> KeyValueMap + Send + Sync` closure is a
//! sanitizer. Fallible logic either implements [`Sanitizer`] directly or is
//! wrapped in [`TryFn`].
//!
//! ```rust
//! use disinfect::KeyValueMap;
//! use disinfect::middleware::disinfect::DisinfectOptions;
//!
//! let options = DisinfectOptions::new().generic_sanitizer(|mut map: KeyValueMap| {
//!     for value in map.values_mut().flatten() {
//!         *value = value.trim().to_owned();
//!     }
//!     map
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::request::KeyValueMap;

/// Error raised by a custom sanitizer. It aborts the request with
/// `500 Internal Server Error`; the handler is not called.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SanitizeError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SanitizeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self { message: message.into(), source: Some(source.into()) }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One `transform(mapping) -> mapping` capability.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, fields: KeyValueMap) -> Result<KeyValueMap, SanitizeError>;
}

/// A sanitizer shared between the server config and every per-request
/// effective config derived from it.
pub type SharedSanitizer = Arc<dyn Sanitizer>;

impl<F> Sanitizer for F
where
    F: Fn(KeyValueMap) -> KeyValueMap + Send + Sync,
{
    fn sanitize(&self, fields: KeyValueMap) -> Result<KeyValueMap, SanitizeError> {
        Ok(self(fields))
    }
}

/// The default for every slot: returns the mapping untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Sanitizer for Identity {
    fn sanitize(&self, fields: KeyValueMap) -> Result<KeyValueMap, SanitizeError> {
        Ok(fields)
    }
}

/// Adapts a fallible closure into a [`Sanitizer`].
///
/// ```rust
/// use disinfect::KeyValueMap;
/// use disinfect::middleware::disinfect::{SanitizeError, TryFn};
///
/// let reject_long = TryFn(|map: KeyValueMap| {
///     if map.values().flatten().any(|v| v.len() > 1024) {
///         return Err(SanitizeError::new("value too long"));
///     }
///     Ok(map)
/// });
/// ```
pub struct TryFn<F>(pub F);

impl<F> Sanitizer for TryFn<F>
where
    F: Fn(KeyValueMap) -> Result<KeyValueMap, SanitizeError> + Send + Sync,
{
    fn sanitize(&self, fields: KeyValueMap) -> Result<KeyValueMap, SanitizeError> {
        (self.0)(fields)
    }
}

impl<F> fmt::Debug for TryFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TryFn(..)")
    }
}

pub(crate) fn identity() -> SharedSanitizer {
    Arc::new(Identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyValueMap {
        KeyValueMap::from([("a".to_owned(), Some("a".to_owned())), ("b".to_owned(), None)])
    }

    #[test]
    fn identity_returns_input() {
        assert_eq!(Identity.sanitize(sample()).unwrap(), sample());
    }

    #[test]
    fn closures_are_sanitizers() {
        let upper = |mut map: KeyValueMap| {
            for v in map.values_mut().flatten() {
                v.make_ascii_uppercase();
            }
            map
        };
        let out = upper.sanitize(sample()).unwrap();
        assert_eq!(out["a"].as_deref(), Some("A"));
        assert_eq!(out["b"], None);
    }

    #[test]
    fn try_fn_propagates_errors() {
        let failing = TryFn(|_: KeyValueMap| -> Result<KeyValueMap, SanitizeError> {
            Err(SanitizeError::new("nope"))
        });
        let err = failing.sanitize(sample()).unwrap_err();
        assert_eq!(err.message(), "nope");
        assert_eq!(err.to_string(), "nope");
    }
}
