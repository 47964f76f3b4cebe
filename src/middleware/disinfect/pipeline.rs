//! The ordered passes applied to one surface.
//!
//! ```text
//! empty / absent ──► returned as-is
//!        │
//!        ▼
//! html (surface flag) ─► generic sanitizer ─► surface sanitizer
//!        ─► whitespace removal (remove_whitespace) ─► empty removal (remove_empty)
//! ```
//!
//! Each pass sees the full output of the previous one. Removal passes look at
//! the value as stored; nothing is trimmed.

use std::fmt;

use tracing::debug;

use super::options::PipelineConfig;
use super::sanitizer::{SanitizeError, Sanitizer};
use super::whitespace::is_whitespace_only;
use crate::request::KeyValueMap;

/// One of the three request data sources.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Surface {
    Query,
    Params,
    Payload,
}

impl Surface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query   => "query",
            Self::Params  => "params",
            Self::Payload => "payload",
        }
    }

    /// Whether the HTML pass runs for this surface.
    pub fn html_enabled(self, config: &PipelineConfig) -> bool {
        match self {
            Self::Query   => config.disinfect_query,
            Self::Params  => config.disinfect_params,
            Self::Payload => config.disinfect_payload,
        }
    }

    /// The surface's own sanitizer slot.
    pub fn sanitizer(self, config: &PipelineConfig) -> &dyn Sanitizer {
        match self {
            Self::Query   => &*config.query_sanitizer,
            Self::Params  => &*config.params_sanitizer,
            Self::Payload => &*config.payload_sanitizer,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the pipeline over an optional mapping. `None` stays `None`.
pub fn disinfect(
    fields: Option<KeyValueMap>,
    config: &PipelineConfig,
    surface: Surface,
) -> Result<Option<KeyValueMap>, SanitizeError> {
    fields.map(|fields| run(fields, config, surface)).transpose()
}

/// Runs the pipeline over a present mapping. An empty mapping is returned
/// without invoking any sanitizer.
pub fn run(
    mut fields: KeyValueMap,
    config: &PipelineConfig,
    surface: Surface,
) -> Result<KeyValueMap, SanitizeError> {
    if fields.is_empty() {
        return Ok(fields);
    }

    if surface.html_enabled(config) {
        sanitize_html(&mut fields);
    }

    fields = config.generic_sanitizer.sanitize(fields)?;
    fields = surface.sanitizer(config).sanitize(fields)?;

    if config.remove_whitespace {
        let removed = remove_whitespace(&mut fields);
        debug!(%surface, removed, "removed whitespace-only values");
    }

    if config.remove_empty {
        let removed = remove_empty(&mut fields);
        debug!(%surface, removed, "removed empty values");
    }

    Ok(fields)
}

/// Replaces every present value with its `ammonia`-cleaned form.
pub fn sanitize_html(fields: &mut KeyValueMap) {
    for value in fields.values_mut().flatten() {
        *value = ammonia::clean(value.as_str());
    }
}

/// Drops keys whose value is non-empty and made only of whitespace.
/// Returns how many keys were removed.
pub fn remove_whitespace(fields: &mut KeyValueMap) -> usize {
    let before = fields.len();
    fields.retain(|_, value| !value.as_deref().is_some_and(is_whitespace_only));
    before - fields.len()
}

/// Drops keys whose value is `""` or absent. Returns how many keys were
/// removed.
pub fn remove_empty(fields: &mut KeyValueMap) -> usize {
    let before = fields.len();
    fields.retain(|_, value| !matches!(value.as_deref(), None | Some("")));
    before - fields.len()
}
