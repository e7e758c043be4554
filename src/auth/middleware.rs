use std::convert::Infallible;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use cookie::Cookie;
use futures::future::BoxFuture;
use serde_json::json;
use tower::{Layer, Service};
use tracing::debug;

use crate::auth::{self, cookies, AuthError};
use crate::config;

/// Requests are buffered so they can be replayed after a token refresh.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Recovers 401/403 responses by performing a single token refresh and
/// replaying the original request once.
///
/// The flow: dispatch the request; on an auth-failure status, read the
/// refresh-token cookie. Without one, the original response stands. With
/// one, mint a new access token, replay the request once with the new
/// token injected into its Cookie header, and attach the new access
/// cookie to the final response. A second 401/403 from the replay is
/// returned as-is; there is never more than one refresh per request.
#[derive(Clone, Copy, Default)]
pub struct ReauthLayer;

impl<S> Layer<S> for ReauthLayer {
    type Service = ReauthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ReauthService { inner }
    }
}

#[derive(Clone)]
pub struct ReauthService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for ReauthService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Take the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return Ok((
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Json(json!({ "detail": "Request body too large." })),
                    )
                        .into_response());
                }
            };

            let response = inner.call(rebuild_request(&parts, &body_bytes)).await?;
            if response.status() != StatusCode::UNAUTHORIZED
                && response.status() != StatusCode::FORBIDDEN
            {
                return Ok(response);
            }

            let cfg = &config::config().security;
            let Some(refresh_token) =
                cookies::read_cookie(&parts.headers, &cfg.refresh_cookie_name)
            else {
                // No refresh credential: the original rejection stands.
                return Ok(response);
            };

            debug!(status = %response.status(), "auth failure, attempting token refresh");

            let new_access = match auth::refresh_access_token(&refresh_token) {
                Ok(token) => token,
                Err(AuthError::InvalidToken) | Err(AuthError::WrongTokenKind) => {
                    return Ok(reauth_failure("Invalid token."));
                }
                Err(_) => {
                    return Ok(reauth_failure("Session expired. Please log in again."));
                }
            };

            let mut retry = rebuild_request(&parts, &body_bytes);
            replace_cookie(&mut retry, &cfg.access_cookie_name, &new_access);

            let mut retried = inner.call(retry).await?;
            if let Ok(value) =
                HeaderValue::from_str(&cookies::access_cookie(&new_access).to_string())
            {
                retried.headers_mut().append(SET_COOKIE, value);
            }
            Ok(retried)
        })
    }
}

fn reauth_failure(detail: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
}

/// Reassemble a request from buffered parts. Extensions are not carried
/// over; the router repopulates them on dispatch.
fn rebuild_request(parts: &Parts, body: &Bytes) -> Request<Body> {
    let mut req = Request::new(Body::from(body.clone()));
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    req
}

/// Replace one cookie in the request's Cookie header, leaving the rest of
/// the pairs intact. The stale value must not survive, or the replayed
/// request would fail auth exactly as before.
fn replace_cookie(req: &mut Request<Body>, name: &str, value: &str) {
    let mut pairs: Vec<String> = Vec::new();
    for header in req.headers().get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for parsed in Cookie::split_parse(raw) {
            if let Ok(cookie) = parsed {
                if cookie.name() != name {
                    pairs.push(format!("{}={}", cookie.name(), cookie.value()));
                }
            }
        }
    }
    pairs.push(format!("{}={}", name, value));

    if let Ok(header) = HeaderValue::from_str(&pairs.join("; ")) {
        req.headers_mut().remove(COOKIE);
        req.headers_mut().insert(COOKIE, header);
    }
}
