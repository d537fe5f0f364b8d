use crate::features::auth::principal::Principal;
use crate::features::auth::services::PrincipalLoader;
use crate::features::auth::session::SessionManager;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Span carrying method, uri and the request id
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any);
    }

    // Session cookies only travel on credentialed requests, which rule out wildcards
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(origins))
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .and_then(|value| value.strip_prefix("Basic "))
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .is_some_and(|creds| creds == *credentials);

            if authorized {
                return Ok(next.run(req).await);
            }

            let response = (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                Body::from("Unauthorized"),
            )
                .into_response();

            Err(response)
        })
    }
}

/// State for [`session_middleware`]
#[derive(Clone)]
pub struct SessionLayerState {
    pub sessions: Arc<SessionManager>,
    pub loader: Arc<PrincipalLoader>,
}

/// Resolve the session cookie to a [`Principal`] and store both in request extensions.
///
/// Every request gets a principal; a missing, expired or stale session yields
/// `Principal::Anonymous`. The raw [`SessionData`](crate::features::auth::session::SessionData)
/// is inserted whenever the cookie verifies, so OAuth2 callbacks and
/// reauthentication can see it.
pub async fn session_middleware(
    State(state): State<SessionLayerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = state.sessions.read(req.headers());

    let principal = match session.as_ref().and_then(|s| s.principal()) {
        Some((kind, id)) => match state.loader.load(kind, id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                tracing::debug!("Session references missing or inactive {} {}", kind, id);
                Principal::Anonymous
            }
            Err(e) => {
                tracing::error!("Failed to resolve session principal: {}", e);
                Principal::Anonymous
            }
        },
        None => Principal::Anonymous,
    };

    if let Some(session) = session {
        req.extensions_mut().insert(session);
    }
    req.extensions_mut().insert(principal);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let mut maker = MakeRequestUuid;
        let request = axum::http::Request::new(());

        let first = maker.make_request_id(&request).unwrap();
        let second = maker.make_request_id(&request).unwrap();

        let first = first.header_value().to_str().unwrap().to_string();
        let second = second.header_value().to_str().unwrap().to_string();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
