//! Per-request configuration resolution.

use std::borrow::Cow;

use super::options::{PipelineConfig, RouteDisinfect};

/// The outcome of [`resolve`] for one request.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// The route opted out; no pass runs on any surface.
    Disabled,
    /// The configuration to run the pipeline with.
    Enabled(Cow<'a, PipelineConfig>),
}

impl Resolution<'_> {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// Derives the effective configuration for a route.
///
/// `Inherit` borrows `server` as-is; `Override` builds a fresh merged value.
/// Neither input is modified.
pub fn resolve<'a>(server: &'a PipelineConfig, route: &RouteDisinfect) -> Resolution<'a> {
    match route {
        RouteDisinfect::Disabled => Resolution::Disabled,
        RouteDisinfect::Inherit => Resolution::Enabled(Cow::Borrowed(server)),
        RouteDisinfect::Override(options) => Resolution::Enabled(Cow::Owned(server.merged(options))),
    }
}
