//! Request-data cleansing.
//!
//! The disinfect stage rewrites a request's query, path parameters and
//! payload after routing and before the handler runs. Each surface goes
//! through the same ordered passes (see [`pipeline`]): HTML cleaning, the
//! generic sanitizer, the surface sanitizer, whitespace-only removal and
//! empty removal.
//!
//! ```rust,no_run
//! use disinfect::middleware::disinfect::{Disinfect, DisinfectOptions, RouteDisinfect};
//! use disinfect::{Json, KeyValueMap, Method, Request, RouteSettings, Router};
//!
//! async fn search(req: Request) -> Json<KeyValueMap> {
//!     Json(req.query().clone())
//! }
//!
//! let app = Router::new()
//!     .disinfect(Disinfect::new(DisinfectOptions::new().remove_empty(true).disinfect_query(true)))
//!     .on(Method::GET, "/search", search)
//!     .on_with(
//!         Method::GET,
//!         "/raw",
//!         RouteSettings::new().disinfect(RouteDisinfect::Disabled),
//!         search,
//!     );
//! ```

mod options;
pub mod pipeline;
mod resolve;
mod sanitizer;
pub mod whitespace;

pub use options::{DisinfectOptions, PipelineConfig, RouteDisinfect};
pub use pipeline::{disinfect, Surface};
pub use resolve::{resolve, Resolution};
pub use sanitizer::{Identity, SanitizeError, Sanitizer, SharedSanitizer, TryFn};

use thiserror::Error;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::request::Request;

/// A sanitizer failed while the stage was running on `surface`.
#[derive(Debug, Error)]
#[error("{surface} sanitizer failed: {source}")]
pub struct DisinfectError {
    pub surface: Surface,
    #[source]
    pub source: SanitizeError,
}

impl DisinfectError {
    fn on(surface: Surface) -> impl FnOnce(SanitizeError) -> Self {
        move |source| Self { surface, source }
    }
}

/// The registered stage: the server-wide configuration plus the logic that
/// applies it to each request.
#[derive(Clone, Debug)]
pub struct Disinfect {
    config: PipelineConfig,
}

impl Disinfect {
    /// Builds the server-wide configuration by merging `options` over the
    /// built-in defaults.
    pub fn new(options: DisinfectOptions) -> Self {
        let config = PipelineConfig::default().merged(&options);
        info!(
            remove_empty = config.remove_empty,
            remove_whitespace = config.remove_whitespace,
            disinfect_query = config.disinfect_query,
            disinfect_params = config.disinfect_params,
            disinfect_payload = config.disinfect_payload,
            "disinfect registered"
        );
        Self { config }
    }

    /// Validates a JSON options document and registers it.
    pub fn from_value(options: serde_json::Value) -> Result<Self, ConfigError> {
        DisinfectOptions::from_value(options).map(Self::new)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the stage over `req` with the route's setting. On error the
    /// request is left partially rewritten and must not reach its handler.
    pub fn apply(&self, req: &mut Request, route: &RouteDisinfect) -> Result<(), DisinfectError> {
        let config = match resolve(&self.config, route) {
            Resolution::Disabled => {
                debug!(path = %req.path, "disinfect disabled for route");
                return Ok(());
            }
            Resolution::Enabled(config) => config,
        };

        req.query = pipeline::run(std::mem::take(&mut req.query), &config, Surface::Query)
            .map_err(DisinfectError::on(Surface::Query))?;
        req.params = pipeline::run(std::mem::take(&mut req.params), &config, Surface::Params)
            .map_err(DisinfectError::on(Surface::Params))?;
        req.payload = disinfect(req.payload.take(), &config, Surface::Payload)
            .map_err(DisinfectError::on(Surface::Payload))?;

        Ok(())
    }
}

impl Default for Disinfect {
    fn default() -> Self {
        Self::new(DisinfectOptions::default())
    }
}
