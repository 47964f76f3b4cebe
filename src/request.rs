//! Incoming HTTP request type and the parsing of its three input surfaces.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

/// A flat key/value mapping: one of query, path parameters or payload.
///
/// `None` is the absence value (a JSON `null` in a payload).
pub type KeyValueMap = BTreeMap<String, Option<String>>;

/// Why an incoming request's inputs could not be turned into mappings.
/// The router answers these with `400 Bad Request`.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("json payload must be an object")]
    NotAnObject,

    #[error("payload field `{0}` must be a string, number, boolean or null")]
    Nested(String),

    #[error("path parameter `{0}` is not valid utf-8")]
    Param(String),
}

/// An incoming HTTP request.
///
/// By the time a handler sees it, `query`, `params` and `payload` have been
/// through the disinfect stage (unless the route opted out).
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) query: KeyValueMap,
    pub(crate) params: KeyValueMap,
    pub(crate) payload: Option<KeyValueMap>,
}

impl Request {
    /// Splits a hyper request into its surfaces. `raw_params` are the
    /// still percent-encoded values captured by the router.
    pub(crate) fn from_http(
        req: http::Request<Bytes>,
        raw_params: Vec<(String, String)>,
    ) -> Result<Self, InputError> {
        let (parts, body) = req.into_parts();

        let query = parts.uri.query().map(parse_form).unwrap_or_default();
        let params = decode_params(raw_params)?;
        let payload = parse_payload(&parts.headers, &body)?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            body,
            query,
            params,
            payload,
        })
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// The raw body, untouched by the disinfect stage.
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self) -> &KeyValueMap { &self.query }
    pub fn params(&self) -> &KeyValueMap { &self.params }

    /// The parsed body, `None` when the body was empty or not a form/JSON
    /// document.
    pub fn payload(&self) -> Option<&KeyValueMap> { self.payload.as_ref() }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }
}

/// Decodes `a=1&b=%20` pairs. A repeated key keeps its last value.
fn parse_form(input: &str) -> KeyValueMap {
    form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .map(|(k, v)| (k, Some(v)))
        .collect()
}

fn decode_params(raw: Vec<(String, String)>) -> Result<KeyValueMap, InputError> {
    raw.into_iter()
        .map(|(key, value)| {
            match percent_decode_str(&value).decode_utf8() {
                Ok(decoded) => {
                    let decoded = decoded.into_owned();
                    Ok((key, Some(decoded)))
                }
                Err(_) => Err(InputError::Param(key)),
            }
        })
        .collect()
}

fn parse_payload(headers: &HeaderMap, body: &Bytes) -> Result<Option<KeyValueMap>, InputError> {
    if body.is_empty() {
        return Ok(None);
    }

    let essence = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

    match essence.as_deref() {
        None | Some("application/json") => parse_json_object(body).map(Some),
        Some("application/x-www-form-urlencoded") => {
            Ok(Some(parse_form(&String::from_utf8_lossy(body))))
        }
        Some(_) => Ok(None),
    }
}

fn parse_json_object(body: &[u8]) -> Result<KeyValueMap, InputError> {
    let Value::Object(object) = serde_json::from_slice::<Value>(body)? else {
        return Err(InputError::NotAnObject);
    };

    object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                Value::Bool(b) => Some(b.to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Array(_) | Value::Object(_) => return Err(InputError::Nested(key)),
            };
            Ok((key, value))
        })
        .collect()
}
