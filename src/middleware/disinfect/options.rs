//! Options schema, the resolved pipeline configuration, and route settings.
//!
//! ```text
//! PipelineConfig::default()          built-in defaults
//!     ← DisinfectOptions             server-wide, merged once at registration
//!     ← RouteDisinfect::Override     per route, merged on every request
//! ```
//!
//! Option documents use camelCase keys (`removeEmpty`, `disinfectQuery`, …).
//! Unknown keys and non-boolean toggles are rejected. Sanitizer slots are
//! code, so they can only be filled through the builder methods.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use super::sanitizer::{identity, Sanitizer, SharedSanitizer};
use crate::error::ConfigError;

/// A fully resolved configuration. Immutable once built.
#[derive(Clone)]
pub struct PipelineConfig {
    pub remove_empty: bool,
    pub remove_whitespace: bool,
    pub disinfect_query: bool,
    pub disinfect_params: bool,
    pub disinfect_payload: bool,
    pub generic_sanitizer: SharedSanitizer,
    pub query_sanitizer: SharedSanitizer,
    pub params_sanitizer: SharedSanitizer,
    pub payload_sanitizer: SharedSanitizer,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            remove_empty: false,
            remove_whitespace: false,
            disinfect_query: false,
            disinfect_params: false,
            disinfect_payload: false,
            generic_sanitizer: identity(),
            query_sanitizer: identity(),
            params_sanitizer: identity(),
            payload_sanitizer: identity(),
        }
    }
}

impl PipelineConfig {
    /// Returns a new config with every field `overlay` sets taking
    /// precedence. Sanitizers are replaced, never combined. `self` is left
    /// untouched.
    pub fn merged(&self, overlay: &DisinfectOptions) -> Self {
        let pick = |slot: &Option<SharedSanitizer>, base: &SharedSanitizer| {
            slot.as_ref().map_or_else(|| Arc::clone(base), Arc::clone)
        };

        Self {
            remove_empty: overlay.remove_empty.unwrap_or(self.remove_empty),
            remove_whitespace: overlay.remove_whitespace.unwrap_or(self.remove_whitespace),
            disinfect_query: overlay.disinfect_query.unwrap_or(self.disinfect_query),
            disinfect_params: overlay.disinfect_params.unwrap_or(self.disinfect_params),
            disinfect_payload: overlay.disinfect_payload.unwrap_or(self.disinfect_payload),
            generic_sanitizer: pick(&overlay.generic_sanitizer, &self.generic_sanitizer),
            query_sanitizer: pick(&overlay.query_sanitizer, &self.query_sanitizer),
            params_sanitizer: pick(&overlay.params_sanitizer, &self.params_sanitizer),
            payload_sanitizer: pick(&overlay.payload_sanitizer, &self.payload_sanitizer),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("remove_empty", &self.remove_empty)
            .field("remove_whitespace", &self.remove_whitespace)
            .field("disinfect_query", &self.disinfect_query)
            .field("disinfect_params", &self.disinfect_params)
            .field("disinfect_payload", &self.disinfect_payload)
            .finish_non_exhaustive()
    }
}

/// A partial [`PipelineConfig`]: registration options or a route override.
///
/// ```rust
/// use disinfect::middleware::disinfect::DisinfectOptions;
///
/// let from_code = DisinfectOptions::new().remove_empty(true).disinfect_query(true);
/// let from_json = DisinfectOptions::from_json_str(r#"{ "removeEmpty": true }"#).unwrap();
/// assert_eq!(from_json.remove_empty, Some(true));
/// # let _ = from_code;
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DisinfectOptions {
    pub remove_empty: Option<bool>,
    pub remove_whitespace: Option<bool>,
    pub disinfect_query: Option<bool>,
    pub disinfect_params: Option<bool>,
    pub disinfect_payload: Option<bool>,
    #[serde(skip)]
    pub generic_sanitizer: Option<SharedSanitizer>,
    #[serde(skip)]
    pub query_sanitizer: Option<SharedSanitizer>,
    #[serde(skip)]
    pub params_sanitizer: Option<SharedSanitizer>,
    #[serde(skip)]
    pub payload_sanitizer: Option<SharedSanitizer>,
}

impl DisinfectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads options from a `.json` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read = || {
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&read()?),
            Some("toml") => Self::from_toml_str(&read()?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_owned())),
        }
    }

    pub fn remove_empty(mut self, on: bool) -> Self {
        self.remove_empty = Some(on);
        self
    }

    pub fn remove_whitespace(mut self, on: bool) -> Self {
        self.remove_whitespace = Some(on);
        self
    }

    pub fn disinfect_query(mut self, on: bool) -> Self {
        self.disinfect_query = Some(on);
        self
    }

    pub fn disinfect_params(mut self, on: bool) -> Self {
        self.disinfect_params = Some(on);
        self
    }

    pub fn disinfect_payload(mut self, on: bool) -> Self {
        self.disinfect_payload = Some(on);
        self
    }

    /// Runs on every surface, before the surface sanitizer.
    pub fn generic_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.generic_sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn query_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.query_sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn params_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.params_sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn payload_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.payload_sanitizer = Some(Arc::new(sanitizer));
        self
    }
}

impl fmt::Debug for DisinfectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisinfectOptions")
            .field("remove_empty", &self.remove_empty)
            .field("remove_whitespace", &self.remove_whitespace)
            .field("disinfect_query", &self.disinfect_query)
            .field("disinfect_params", &self.disinfect_params)
            .field("disinfect_payload", &self.disinfect_payload)
            .field("generic_sanitizer", &self.generic_sanitizer.is_some())
            .field("query_sanitizer", &self.query_sanitizer.is_some())
            .field("params_sanitizer", &self.params_sanitizer.is_some())
            .field("payload_sanitizer", &self.payload_sanitizer.is_some())
            .finish()
    }
}

/// The per-route `disinfect` setting.
///
/// In a document: `null` inherits, `false` disables, an options object
/// overrides. `true` is rejected.
#[derive(Clone, Debug, Default)]
pub enum RouteDisinfect {
    /// Use the server-wide configuration.
    #[default]
    Inherit,
    /// Skip the stage for every surface of this route.
    Disabled,
    /// Merge these options over the server-wide configuration.
    Override(DisinfectOptions),
}

impl RouteDisinfect {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::RouteSetting(e.to_string()))
    }
}

impl From<DisinfectOptions> for RouteDisinfect {
    fn from(options: DisinfectOptions) -> Self {
        Self::Override(options)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRouteDisinfect {
    Flag(bool),
    Options(DisinfectOptions),
}

impl<'de> Deserialize<'de> for RouteDisinfect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawRouteDisinfect>::deserialize(deserializer)? {
            None => Ok(Self::Inherit),
            Some(RawRouteDisinfect::Flag(false)) => Ok(Self::Disabled),
            Some(RawRouteDisinfect::Flag(true)) => Err(de::Error::custom(
                "expected `false` or an options object, found `true`",
            )),
            Some(RawRouteDisinfect::Options(options)) => Ok(Self::Override(options)),
        }
    }
}
