//! # disinfect
//!
//! A minimal HTTP framework whose requests are cleansed before any handler
//! sees them.
//!
//! Every matched request has its three input surfaces (query string, path
//! parameters, payload) parsed into flat [`KeyValueMap`]s. The
//! [`disinfect`](middleware::disinfect) stage then rewrites each surface
//! through a fixed chain of passes:
//!
//! 1. HTML cleaning with [`ammonia`] (per-surface toggle)
//! 2. a generic sanitizer, shared by all surfaces
//! 3. a surface-specific sanitizer
//! 4. removal of whitespace-only values (toggle)
//! 5. removal of empty values (toggle)
//!
//! Server-wide options are fixed at registration; each route may inherit
//! them, override individual fields, or opt out entirely.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use disinfect::middleware::disinfect::{Disinfect, DisinfectOptions};
//! use disinfect::{Json, KeyValueMap, Method, Request, RouteSettings, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), disinfect::Error> {
//!     let options = DisinfectOptions::load("disinfect.toml")?
//!         .generic_sanitizer(|mut fields: KeyValueMap| {
//!             fields.remove("debug");
//!             fields
//!         });
//!
//!     let app = Router::new()
//!         .disinfect(Disinfect::new(options))
//!         .on(Method::GET, "/search", search)
//!         .on_with(
//!             Method::POST,
//!             "/comments/{id}",
//!             RouteSettings::new().disinfect(DisinfectOptions::new().disinfect_payload(true)),
//!             comment,
//!         );
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn search(req: Request) -> Json<KeyValueMap> {
//!     Json(req.query().clone())
//! }
//!
//! async fn comment(req: Request) -> Json<Option<KeyValueMap>> {
//!     Json(req.payload().cloned())
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::{ConfigError, Error};
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use request::{InputError, KeyValueMap, Request};
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{RouteSettings, Router};
pub use server::Server;
