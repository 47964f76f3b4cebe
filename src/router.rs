//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A matched request goes
//! through input parsing and the disinfect stage, in that order, before its
//! handler is called.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::{debug, error};

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::disinfect::{Disinfect, RouteDisinfect};
use crate::request::Request;
use crate::response::Response;

/// Per-route settings consulted by middleware stages.
#[derive(Clone, Debug, Default)]
pub struct RouteSettings {
    pub disinfect: RouteDisinfect,
}

impl RouteSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the route's disinfect setting. Accepts a [`RouteDisinfect`] or a
    /// [`DisinfectOptions`](crate::middleware::disinfect::DisinfectOptions)
    /// override.
    pub fn disinfect(mut self, setting: impl Into<RouteDisinfect>) -> Self {
        self.disinfect = setting.into();
        self
    }
}

struct Route {
    handler: BoxedHandler,
    settings: RouteSettings,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Arc<Route>>>,
    disinfect: Option<Disinfect>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), disinfect: None }
    }

    /// Registers the disinfect stage. Registering again replaces the
    /// previous configuration.
    pub fn disinfect(mut self, stage: Disinfect) -> Self {
        self.disinfect = Some(stage);
        self
    }

    /// Register a handler for a method + path pair with default settings.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.on_with(method, path, RouteSettings::default(), handler)
    }

    /// Like [`on`](Self::on), with per-route settings.
    pub fn on_with(
        mut self,
        method: Method,
        path: &str,
        settings: RouteSettings,
        handler: impl Handler,
    ) -> Self {
        let route = Arc::new(Route { handler: handler.into_boxed_handler(), settings });
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(Arc<Route>, Vec<(String, String)>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let route = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((route, params))
    }

    /// Routes one request and produces one response, in-process.
    ///
    /// `404` when no route matches, `400` when the inputs cannot be parsed,
    /// `500` when a sanitizer fails. Otherwise the handler's response.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let Some((route, raw_params)) = self.lookup(req.method(), req.uri().path()) else {
            return Response::status(StatusCode::NOT_FOUND);
        };

        let mut request = match Request::from_http(req, raw_params) {
            Ok(request) => request,
            Err(e) => {
                debug!("rejecting request: {e}");
                return Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .text(e.to_string());
            }
        };

        if let Some(stage) = &self.disinfect {
            if let Err(e) = stage.apply(&mut request, &route.settings.disinfect) {
                error!(path = %request.path, surface = %e.surface, "disinfect failed: {}", e.source);
                return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }

        route.handler.call(request).await
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::disinfect::DisinfectOptions;

    async fn ok(_req: Request) -> &'static str {
        "ok"
    }

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = Router::new().on(Method::GET, "/", ok);
        assert_eq!(app.handle(get("/missing")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_not_found() {
        let app = Router::new().on(Method::POST, "/", ok);
        assert_eq!(app.handle(get("/")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn routes_without_stage_reach_handler() {
        let app = Router::new().on(Method::GET, "/", ok);
        let res = app.handle(get("/?a=")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"ok");
    }

    #[tokio::test]
    async fn malformed_payload_is_bad_request() {
        let app = Router::new()
            .disinfect(Disinfect::new(DisinfectOptions::new().remove_empty(true)))
            .on(Method::POST, "/", ok);
        let req = http::Request::post("/")
            .header("content-type", "application/json")
            .body(Bytes::from_static(b"{not json"))
            .unwrap();
        assert_eq!(app.handle(req).await.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new().on(Method::GET, "/{a}", ok).on(Method::GET, "/{b}", ok);
    }

    #[test]
    fn route_settings_accept_options_as_override() {
        let settings = RouteSettings::new().disinfect(DisinfectOptions::new().remove_empty(true));
        assert!(matches!(settings.disinfect, RouteDisinfect::Override(_)));
    }
}
