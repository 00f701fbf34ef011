//! Caller identity for SHELF handlers.
//!
//! Authentication happens upstream. Whatever authenticated the caller stores
//! an [`Identity`] in the request extensions; handlers that need it take
//! `Identity` as an extractor and the request is rejected with 401 when it is
//! missing. [`with_trusted_headers`] is the stock upstream layer for
//! deployments behind an authenticating proxy.

use anyhow::Context;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, HeaderName},
    middleware::{self, Next},
    response::Response,
    Router,
};
use shelf_http::ApiError;
use shelf_kernel::settings::AuthSettings;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User id exactly as the authenticator supplied it.
    pub user_id: String,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    /// Numeric user id; anything that does not parse as an unsigned integer
    /// yields 0.
    pub fn numeric_user_id(&self) -> u64 {
        self.user_id.parse().unwrap_or(0)
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// Header names the trusted proxy uses to forward identity.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    user_id: HeaderName,
    user_email: HeaderName,
}

impl IdentityHeaders {
    pub fn from_settings(settings: &AuthSettings) -> anyhow::Result<Self> {
        Ok(Self {
            user_id: HeaderName::try_from(settings.user_id_header.as_str()).with_context(|| {
                format!("invalid user id header '{}'", settings.user_id_header)
            })?,
            user_email: HeaderName::try_from(settings.user_email_header.as_str()).with_context(
                || format!("invalid user email header '{}'", settings.user_email_header),
            )?,
        })
    }

    /// Identity carried by `headers`, if the user id header is present.
    pub fn identity(&self, headers: &HeaderMap) -> Option<Identity> {
        let user_id = headers.get(&self.user_id)?.to_str().ok()?;
        let email = headers
            .get(&self.user_email)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        Some(Identity::new(user_id, email))
    }
}

async fn trusted_headers(
    State(headers): State<IdentityHeaders>,
    mut request: Request,
    next: Next,
) -> Response {
    match headers.identity(request.headers()) {
        Some(identity) => {
            tracing::debug!(user_id = %identity.user_id, "identity forwarded by proxy");
            request.extensions_mut().insert(identity);
        }
        None => {
            // Never trust an identity that did not come from the headers.
            request.extensions_mut().remove::<Identity>();
        }
    }
    next.run(request).await
}

/// Populate [`Identity`] from the configured proxy headers on every request.
pub fn with_trusted_headers(router: Router, headers: IdentityHeaders) -> Router {
    router.layer(middleware::from_fn_with_state(headers, trusted_headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn whoami(identity: Identity) -> String {
        format!("{}|{}|{}", identity.user_id, identity.email, identity.numeric_user_id())
    }

    fn app() -> Router {
        let headers = IdentityHeaders::from_settings(&AuthSettings::default()).unwrap();
        with_trusted_headers(Router::new().route("/whoami", get(whoami)), headers)
    }

    #[test]
    fn numeric_user_id_falls_back_to_zero() {
        assert_eq!(Identity::new("42", "a@b.c").numeric_user_id(), 42);
        assert_eq!(Identity::new("abc", "a@b.c").numeric_user_id(), 0);
        assert_eq!(Identity::new("-7", "a@b.c").numeric_user_id(), 0);
        assert_eq!(Identity::new("", "a@b.c").numeric_user_id(), 0);
    }

    #[test]
    fn invalid_header_names_are_rejected() {
        let settings = AuthSettings {
            user_id_header: "bad header".to_string(),
            ..AuthSettings::default()
        };
        assert!(IdentityHeaders::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn identity_is_taken_from_headers() {
        let response = app()
            .oneshot(
                HttpRequest::get("/whoami")
                    .header("x-user-id", "42")
                    .header("x-user-email", "reader@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"42|reader@example.com|42");
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let response = app()
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Unauthorized" }));
    }
}
