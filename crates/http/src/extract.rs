//! Request extractors used by module controllers.
//!
//! Query strings and JSON bodies bind to fields case-insensitively: keys are
//! lowercased before deserialization, so request types must use lowercase
//! field names. Empty query values count as absent, and when a key repeats
//! the last occurrence wins.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shelf_kernel::RequestCtx;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rejection for input that could not be decoded. Carries the parser message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InputRejection {
    pub message: String,
}

impl InputRejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<InputRejection> for ApiError {
    fn from(rejection: InputRejection) -> Self {
        ApiError::bad_request(rejection.message)
    }
}

impl IntoResponse for InputRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Query string extractor with case-insensitive keys.
#[derive(Debug, Clone)]
pub struct CiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for CiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        decode_query(parts.uri.query().unwrap_or_default()).map(CiQuery)
    }
}

pub fn decode_query<T: DeserializeOwned>(raw: &str) -> Result<T, InputRejection> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(raw).map_err(|e| InputRejection::new(e.to_string()))?;

    let mut merged: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        let key = key.to_lowercase();
        merged.retain(|(existing, _)| *existing != key);
        if !value.is_empty() {
            merged.push((key, value));
        }
    }

    let normalized =
        serde_urlencoded::to_string(&merged).map_err(|e| InputRejection::new(e.to_string()))?;
    serde_urlencoded::from_str(&normalized).map_err(|e| InputRejection::new(e.to_string()))
}

/// JSON body extractor with case-insensitive top-level keys.
#[derive(Debug, Clone)]
pub struct CiJson<T>(pub T);

impl<T, S> FromRequest<S> for CiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !json_content_type(req.headers()) {
            return Err(InputRejection::new(MISSING_JSON_CONTENT_TYPE));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| InputRejection::new(rejection.body_text()))?;
        decode_json(&bytes).map(CiJson)
    }
}

const MISSING_JSON_CONTENT_TYPE: &str = "Expected request with `Content-Type: application/json`";

/// `application/json` or any `application/*+json`, parameters ignored.
fn json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, InputRejection> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| InputRejection::new(e.to_string()))?;
    let value = match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect(),
        ),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| InputRejection::new(e.to_string()))
}

/// Per-request [`RequestCtx`] whose token is cancelled when this value drops.
///
/// The handler future owns the scope, so a client disconnect or a server
/// timeout (both drop the future) cancels any work the use-case spawned.
pub struct RequestScope {
    ctx: RequestCtx,
    _guard: DropGuard,
}

impl RequestScope {
    pub fn new(request_id: Option<String>) -> Self {
        let token = CancellationToken::new();
        Self {
            ctx: RequestCtx::new(request_id, token.clone()),
            _guard: token.drop_guard(),
        }
    }

    pub fn ctx(&self) -> &RequestCtx {
        &self.ctx
    }
}

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(Self::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Default)]
    #[serde(default)]
    struct Filter {
        title: Option<String>,
        limit: Option<u32>,
    }

    #[test]
    fn query_keys_match_case_insensitively() {
        let filter: Filter = decode_query("TITLE=Dune&Limit=5").unwrap();
        assert_eq!(
            filter,
            Filter {
                title: Some("Dune".to_string()),
                limit: Some(5),
            }
        );
    }

    #[test]
    fn query_values_keep_their_case_and_encoding() {
        let filter: Filter = decode_query("title=The%20Left%20Hand").unwrap();
        assert_eq!(filter.title.as_deref(), Some("The Left Hand"));
    }

    #[test]
    fn non_numeric_limit_is_rejected() {
        let rejection = decode_query::<Filter>("limit=ten").unwrap_err();
        assert!(!rejection.message.is_empty());
    }

    #[test]
    fn empty_query_yields_defaults() {
        let filter: Filter = decode_query("").unwrap();
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn empty_query_values_are_treated_as_absent() {
        let filter: Filter = decode_query("title=&limit=&page=").unwrap();
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let filter: Filter = decode_query("title=a&TITLE=b&limit=3&Limit=").unwrap();
        assert_eq!(filter.title.as_deref(), Some("b"));
        assert_eq!(filter.limit, None);
    }

    #[test]
    fn json_content_type_accepts_json_media_types_only() {
        let headers = |value: &str| {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, value.parse().unwrap());
            headers
        };

        assert!(json_content_type(&headers("application/json")));
        assert!(json_content_type(&headers("Application/JSON; charset=utf-8")));
        assert!(json_content_type(&headers("application/merge-patch+json")));
        assert!(!json_content_type(&headers("text/plain")));
        assert!(!json_content_type(&headers("application/x-www-form-urlencoded")));
        assert!(!json_content_type(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn json_body_without_content_type_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(axum::body::Body::from(r#"{"title":"x"}"#))
            .unwrap();

        let rejection = CiJson::<Filter>::from_request(request, &()).await.unwrap_err();

        assert_eq!(rejection.message, MISSING_JSON_CONTENT_TYPE);
    }

    #[test]
    fn json_keys_match_case_insensitively() {
        let filter: Filter = decode_json(br#"{"Title":"X","LIMIT":3}"#).unwrap();
        assert_eq!(filter.title.as_deref(), Some("X"));
        assert_eq!(filter.limit, Some(3));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(decode_json::<Filter>(b"{\"title\":").is_err());
        assert!(decode_json::<Filter>(b"").is_err());
        assert!(decode_json::<Filter>(br#"{"limit":"many"}"#).is_err());
    }

    #[test]
    fn dropping_the_scope_cancels_the_context() {
        let scope = RequestScope::new(Some("abc".to_string()));
        let ctx = scope.ctx().clone();
        assert_eq!(ctx.request_id(), Some("abc"));
        assert!(!ctx.is_cancelled());

        drop(scope);

        assert!(ctx.is_cancelled());
    }
}
