//! End-to-end behaviour of the disinfect stage, driven through
//! `Router::handle` without opening a socket.

use bytes::Bytes;
use disinfect::middleware::disinfect::{Disinfect, DisinfectOptions, RouteDisinfect, SanitizeError, TryFn};
use disinfect::{Json, KeyValueMap, Method, Request, RouteSettings, Router, StatusCode};
use serde_json::{json, Value};

const DIRTY: &str = "<b>hello <i>world</i><script src=foo.js></script></b>";
const CLEAN: &str = "<b>hello <i>world</i></b>";
const DIRTY_ENCODED: &str = "%3Cb%3Ehello%20%3Ci%3Eworld%3C%2Fi%3E%3Cscript%20src%3Dfoo.js%3E%3C%2Fscript%3E%3C%2Fb%3E";

async fn echo_query(req: Request) -> Json<KeyValueMap> {
    Json(req.query().clone())
}

async fn echo_params(req: Request) -> Json<KeyValueMap> {
    Json(req.params().clone())
}

async fn echo_payload(req: Request) -> Json<Option<KeyValueMap>> {
    Json(req.payload().cloned())
}

/// The three echo routes every test starts from.
fn app(stage: Disinfect) -> Router {
    Router::new()
        .disinfect(stage)
        .on(Method::GET, "/queryTest", echo_query)
        .on(Method::GET, "/paramsTest/{a}", echo_params)
        .on(Method::GET, "/paramsTest/{a}/{b}", echo_params)
        .on(Method::POST, "/payloadTest", echo_payload)
}

fn append(suffix: &'static str) -> impl Fn(KeyValueMap) -> KeyValueMap + Send + Sync {
    move |mut fields: KeyValueMap| {
        for value in fields.values_mut().flatten() {
            value.push_str(suffix);
        }
        fields
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = http::Request::get(uri).body(Bytes::new()).unwrap();
    send(app, req).await
}

async fn post(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let req = http::Request::post(uri)
        .header("content-type", "application/json")
        .body(Bytes::from(payload.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(app: &Router, req: http::Request<Bytes>) -> (StatusCode, Value) {
    let res = app.handle(req).await;
    let body = if res.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(res.body()).unwrap()
    };
    (res.status_code(), body)
}

#[tokio::test]
async fn registers_without_options() {
    let app = app(Disinfect::from_value(json!({})).unwrap())
        .on(Method::GET, "/", |_req: Request| async { Json(Value::Null) });

    assert_eq!(get(&app, "/").await, (StatusCode::OK, Value::Null));
    assert_eq!(get(&app, "/queryTest?a=&b=%20").await, (StatusCode::OK, json!({ "a": "", "b": " " })));
}

#[test]
fn registration_fails_on_unknown_option() {
    let err = Disinfect::from_value(json!({ "some": "value" })).unwrap_err();
    assert!(err.to_string().contains("some"));
}

#[tokio::test]
async fn can_be_disabled_per_route() {
    let disabled = || RouteSettings::new().disinfect(RouteDisinfect::Disabled);
    let app = app(Disinfect::new(
        DisinfectOptions::new().remove_empty(true).disinfect_query(true).generic_sanitizer(append("x")),
    ))
    .on_with(Method::GET, "/disabled", disabled(), echo_query)
    .on_with(Method::POST, "/disabled", disabled(), echo_payload);

    let (status, body) = get(&app, "/disabled?a=&b=&c=c").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "a": "", "b": "", "c": "c" }));

    let (_, body) = post(&app, "/disabled", json!({ "a": "", "b": "", "c": "c" })).await;
    assert_eq!(body, json!({ "a": "", "b": "", "c": "c" }));

    // Other routes still run the stage; the generic sanitizer fills `a`
    // before empty removal looks at it.
    let (_, body) = get(&app, "/queryTest?a=&c=c").await;
    assert_eq!(body, json!({ "a": "x", "c": "cx" }));
}

#[tokio::test]
async fn disabled_route_leaves_params_untouched() {
    let app = app(Disinfect::new(
        DisinfectOptions::new()
            .remove_whitespace(true)
            .disinfect_params(true)
            .generic_sanitizer(append("x")),
    ))
    .on_with(
        Method::GET,
        "/disabled/{a}/{b}",
        RouteSettings::new().disinfect(RouteDisinfect::Disabled),
        echo_params,
    );

    let (status, body) = get(&app, "/disabled/%20%20/b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "a": "  ", "b": "b" }));

    // Same input on an enabled params route.
    let (_, body) = get(&app, "/paramsTest/%20%20/b").await;
    assert_eq!(body, json!({ "a": "  x", "b": "bx" }));
}

#[tokio::test]
async fn removes_empties() {
    let app = app(Disinfect::new(DisinfectOptions::new().remove_empty(true)));

    assert_eq!(get(&app, "/queryTest?a=&b=&c=c").await.1, json!({ "c": "c" }));
    assert_eq!(
        post(&app, "/payloadTest", json!({ "a": "", "b": null, "c": "c" })).await.1,
        json!({ "c": "c" })
    );
}

#[tokio::test]
async fn removes_empties_on_a_per_route_config() {
    let per_route = || RouteSettings::new().disinfect(DisinfectOptions::new().remove_empty(true));
    let app = app(Disinfect::default())
        .on_with(Method::GET, "/queryTestPerRoute", per_route(), echo_query)
        .on_with(Method::POST, "/payloadTestPerRoute", per_route(), echo_payload);

    assert_eq!(get(&app, "/queryTestPerRoute?a=&b=&c=c").await.1, json!({ "c": "c" }));
    assert_eq!(
        post(&app, "/payloadTestPerRoute", json!({ "a": "", "b": "", "c": "c" })).await.1,
        json!({ "c": "c" })
    );

    // The override only applies to its own routes.
    assert_eq!(get(&app, "/queryTest?a=&c=c").await.1, json!({ "a": "", "c": "c" }));
}

#[tokio::test]
async fn removes_whitespaces() {
    let app = app(Disinfect::new(DisinfectOptions::new().remove_whitespace(true)));

    assert_eq!(get(&app, "/queryTest?a=%20%20%20&b=%20%20%20&c=c").await.1, json!({ "c": "c" }));
    assert_eq!(get(&app, "/paramsTest/%20%20%20%20%20%20/5").await.1, json!({ "b": "5" }));
    assert_eq!(
        post(&app, "/payloadTest", json!({ "a": "      ", "b": "       ", "c": "c" })).await.1,
        json!({ "c": "c" })
    );
}

#[tokio::test]
async fn removes_whitespaces_on_a_per_route_config() {
    let per_route = || RouteSettings::new().disinfect(DisinfectOptions::new().remove_whitespace(true));
    let app = app(Disinfect::default())
        .on_with(Method::GET, "/queryTestPerRoute", per_route(), echo_query)
        .on_with(Method::GET, "/paramsTestPerRoute/{a}/{b}", per_route(), echo_params)
        .on_with(Method::POST, "/payloadTestPerRoute", per_route(), echo_payload);

    assert_eq!(get(&app, "/queryTestPerRoute?a=%20%20%20&b=%20%20%20&c=c").await.1, json!({ "c": "c" }));
    assert_eq!(get(&app, "/paramsTestPerRoute/%20%20%20%20%20%20/c").await.1, json!({ "b": "c" }));
    assert_eq!(
        post(&app, "/payloadTestPerRoute", json!({ "a": "      ", "b": "       ", "c": "c" })).await.1,
        json!({ "c": "c" })
    );
}

#[tokio::test]
async fn sanitizes_query() {
    let app = app(Disinfect::new(DisinfectOptions::new().disinfect_query(true)));
    assert_eq!(get(&app, &format!("/queryTest?a={DIRTY_ENCODED}")).await.1, json!({ "a": CLEAN }));
}

#[tokio::test]
async fn sanitizes_query_on_a_per_route_config() {
    let app = app(Disinfect::default()).on_with(
        Method::GET,
        "/queryTestPerRoute",
        RouteSettings::new().disinfect(DisinfectOptions::new().disinfect_query(true)),
        echo_query,
    );
    assert_eq!(get(&app, &format!("/queryTestPerRoute?a={DIRTY_ENCODED}")).await.1, json!({ "a": CLEAN }));
    assert_eq!(get(&app, &format!("/queryTest?a={DIRTY_ENCODED}")).await.1, json!({ "a": DIRTY }));
}

#[tokio::test]
async fn sanitizes_params() {
    let app = app(Disinfect::new(DisinfectOptions::new().disinfect_params(true)));
    assert_eq!(get(&app, &format!("/paramsTest/{DIRTY_ENCODED}")).await.1, json!({ "a": CLEAN }));
}

#[tokio::test]
async fn sanitizes_params_on_a_per_route_config() {
    let app = app(Disinfect::default()).on_with(
        Method::GET,
        "/paramsTestPerRoute/{a}",
        RouteSettings::new().disinfect(DisinfectOptions::new().disinfect_params(true)),
        echo_params,
    );
    assert_eq!(get(&app, &format!("/paramsTestPerRoute/{DIRTY_ENCODED}")).await.1, json!({ "a": CLEAN }));
}

#[tokio::test]
async fn sanitizes_payload() {
    let app = app(Disinfect::new(DisinfectOptions::new().disinfect_payload(true)));
    assert_eq!(post(&app, "/payloadTest", json!({ "a": DIRTY })).await.1, json!({ "a": CLEAN }));
    // Query is not covered by the payload flag.
    assert_eq!(get(&app, &format!("/queryTest?a={DIRTY_ENCODED}")).await.1, json!({ "a": DIRTY }));
}

#[tokio::test]
async fn sanitizes_payload_on_a_per_route_config() {
    let app = app(Disinfect::default()).on_with(
        Method::POST,
        "/payloadTestPerRoute",
        RouteSettings::new().disinfect(DisinfectOptions::new().disinfect_payload(true)),
        echo_payload,
    );
    assert_eq!(post(&app, "/payloadTestPerRoute", json!({ "a": DIRTY })).await.1, json!({ "a": CLEAN }));
}

#[tokio::test]
async fn accepts_custom_generic_sanitizer() {
    let app = app(Disinfect::new(DisinfectOptions::new().generic_sanitizer(append("x"))));

    assert_eq!(get(&app, "/queryTest?a=a&b=b&c=c").await.1, json!({ "a": "ax", "b": "bx", "c": "cx" }));
    assert_eq!(get(&app, "/paramsTest/a/b").await.1, json!({ "a": "ax", "b": "bx" }));
    assert_eq!(
        post(&app, "/payloadTest", json!({ "a": "a", "b": "b", "c": "c" })).await.1,
        json!({ "a": "ax", "b": "bx", "c": "cx" })
    );
}

#[tokio::test]
async fn accepts_generic_sanitizer_on_a_per_route_config() {
    let with = |suffix: &'static str| RouteSettings::new().disinfect(DisinfectOptions::new().generic_sanitizer(append(suffix)));
    let app = app(Disinfect::default())
        .on_with(Method::GET, "/queryTestPerRoute", with("1"), echo_query)
        .on_with(Method::GET, "/paramsTestPerRoute/{a}/{b}", with("2"), echo_params)
        .on_with(Method::POST, "/payloadTestPerRoute", with("3"), echo_payload);

    assert_eq!(get(&app, "/queryTestPerRoute?a=a&b=b&c=c").await.1, json!({ "a": "a1", "b": "b1", "c": "c1" }));
    assert_eq!(get(&app, "/paramsTestPerRoute/a/b").await.1, json!({ "a": "a2", "b": "b2" }));
    assert_eq!(
        post(&app, "/payloadTestPerRoute", json!({ "a": "a", "b": "b", "c": "c" })).await.1,
        json!({ "a": "a3", "b": "b3", "c": "c3" })
    );
}

#[tokio::test]
async fn accepts_query_sanitizer() {
    let app = app(Disinfect::new(DisinfectOptions::new().query_sanitizer(append("q"))));
    assert_eq!(get(&app, "/queryTest?a=a&b=b&c=c").await.1, json!({ "a": "aq", "b": "bq", "c": "cq" }));
    assert_eq!(get(&app, "/paramsTest/a/b").await.1, json!({ "a": "a", "b": "b" }));
}

#[tokio::test]
async fn accepts_query_sanitizer_on_a_per_route_config() {
    let app = app(Disinfect::default()).on_with(
        Method::GET,
        "/queryTestPerRoute",
        RouteSettings::new().disinfect(DisinfectOptions::new().query_sanitizer(append("q1"))),
        echo_query,
    );
    assert_eq!(get(&app, "/queryTestPerRoute?a=a&b=b&c=c").await.1, json!({ "a": "aq1", "b": "bq1", "c": "cq1" }));
}

#[tokio::test]
async fn accepts_params_sanitizer() {
    let app = app(Disinfect::new(DisinfectOptions::new().params_sanitizer(append("m"))));
    assert_eq!(get(&app, "/paramsTest/a/b").await.1, json!({ "a": "am", "b": "bm" }));
}

#[tokio::test]
async fn route_params_sanitizer_replaces_server_one() {
    let app = app(Disinfect::new(DisinfectOptions::new().params_sanitizer(append("m"))))
        .on_with(
            Method::GET,
            "/paramsTestPerRoute/{a}/{b}",
            RouteSettings::new().disinfect(DisinfectOptions::new().params_sanitizer(append("m1"))),
            echo_params,
        );
    assert_eq!(get(&app, "/paramsTestPerRoute/a/b").await.1, json!({ "a": "am1", "b": "bm1" }));
    assert_eq!(get(&app, "/paramsTest/a/b").await.1, json!({ "a": "am", "b": "bm" }));
}

#[tokio::test]
async fn accepts_payload_sanitizer() {
    let app = app(Disinfect::new(DisinfectOptions::new().payload_sanitizer(append("p"))));
    assert_eq!(
        post(&app, "/payloadTest", json!({ "a": "a", "b": "b", "c": "c" })).await.1,
        json!({ "a": "ap", "b": "bp", "c": "cp" })
    );
}

#[tokio::test]
async fn accepts_payload_sanitizer_on_a_per_route_config() {
    let app = app(Disinfect::default()).on_with(
        Method::POST,
        "/payloadTestPerRoute",
        RouteSettings::new().disinfect(DisinfectOptions::new().payload_sanitizer(append("p1"))),
        echo_payload,
    );
    assert_eq!(
        post(&app, "/payloadTestPerRoute", json!({ "a": "a", "b": "b", "c": "c" })).await.1,
        json!({ "a": "ap1", "b": "bp1", "c": "cp1" })
    );
}

#[tokio::test]
async fn empty_body_leaves_payload_absent() {
    let app = app(Disinfect::new(DisinfectOptions::new().payload_sanitizer(append("p"))));
    let req = http::Request::post("/payloadTest").body(Bytes::new()).unwrap();
    assert_eq!(send(&app, req).await, (StatusCode::OK, Value::Null));
}

#[tokio::test]
async fn failing_sanitizer_is_a_server_error() {
    let failing = TryFn(|_: KeyValueMap| -> Result<KeyValueMap, SanitizeError> {
        Err(SanitizeError::new("rejected"))
    });
    let app = app(Disinfect::new(DisinfectOptions::new().payload_sanitizer(failing)));

    let (status, _) = post(&app, "/payloadTest", json!({ "a": "a" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // An empty query never reaches a sanitizer, so it cannot fail.
    assert_eq!(get(&app, "/queryTest").await, (StatusCode::OK, json!({})));
}

#[tokio::test]
async fn route_setting_from_document() {
    let setting = RouteDisinfect::from_json_str(r#"{ "removeEmpty": true }"#).unwrap();
    let app = app(Disinfect::default()).on_with(
        Method::GET,
        "/fromDoc",
        RouteSettings::new().disinfect(setting),
        echo_query,
    );
    assert_eq!(get(&app, "/fromDoc?a=&c=c").await.1, json!({ "c": "c" }));
}
