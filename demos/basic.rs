//! Minimal disinfect example: echo endpoints for each input surface.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/query?a=&b=%20%20&c=%3Cscript%3Ex%3C%2Fscript%3Eok'
//!   curl 'http://localhost:3000/users/%20%20/posts/7'
//!   curl -X POST http://localhost:3000/comments \
//!        -H 'content-type: application/json' \
//!        -d '{"body":"<b>hi</b><script>alert(1)</script>","draft":null}'
//!   curl 'http://localhost:3000/raw?a=&b=%3Ci%3Euntouched%3C%2Fi%3E'

use disinfect::middleware::disinfect::{Disinfect, DisinfectOptions, RouteDisinfect};
use disinfect::{Json, KeyValueMap, Method, Request, RouteSettings, Router, Server};

#[tokio::main]
async fn main() -> Result<(), disinfect::Error> {
    tracing_subscriber::fmt::init();

    let options = DisinfectOptions::from_toml_str(
        r#"
        removeEmpty = true
        removeWhitespace = true
        disinfectQuery = true
        disinfectPayload = true
        "#,
    )?
    .generic_sanitizer(|mut fields: KeyValueMap| {
        for value in fields.values_mut().flatten() {
            if let Some((cut, _)) = value.char_indices().nth(256) {
                value.truncate(cut);
            }
        }
        fields
    });

    let app = Router::new()
        .disinfect(Disinfect::new(options))
        .on(Method::GET, "/query", echo_query)
        .on(Method::GET, "/users/{user}/posts/{post}", echo_params)
        .on(Method::POST, "/comments", echo_payload)
        .on_with(
            Method::GET,
            "/raw",
            RouteSettings::new().disinfect(RouteDisinfect::Disabled),
            echo_query,
        );

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

async fn echo_query(req: Request) -> Json<KeyValueMap> {
    Json(req.query().clone())
}

async fn echo_params(req: Request) -> Json<KeyValueMap> {
    Json(req.params().clone())
}

async fn echo_payload(req: Request) -> Json<Option<KeyValueMap>> {
    Json(req.payload().cloned())
}
