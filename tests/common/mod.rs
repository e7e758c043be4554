#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_api::{app, config, AppState};

/// Build an app over a fresh in-memory database. Each test gets its own
/// isolated store.
pub async fn test_app() -> Router {
    let pool = bookshelf_api::database::manager::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite");
    app(AppState { pool })
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookies: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookies {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json body")
}

/// Extract a cookie value from the response's Set-Cookie headers.
pub fn response_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for header in response.headers().get_all(SET_COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        if let Some(rest) = raw.strip_prefix(&prefix) {
            return Some(rest.split(';').next().unwrap_or("").to_string());
        }
    }
    None
}

pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user: Value,
}

impl Session {
    /// Cookie header carrying both tokens, as a browser would send them.
    pub fn cookie_header(&self) -> String {
        let cfg = &config::config().security;
        format!(
            "{}={}; {}={}",
            cfg.access_cookie_name, self.access, cfg.refresh_cookie_name, self.refresh
        )
    }

    pub fn access_only(&self) -> String {
        let cfg = &config::config().security;
        format!("{}={}", cfg.access_cookie_name, self.access)
    }
}

pub async fn register_user(app: &Router, email: &str, password: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": password, "password2": password })),
    )
    .await;
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "registration should succeed"
    );
    body_json(response).await
}

pub async fn login_user(app: &Router, login: &str, password: &str) -> Session {
    let response = send(
        app,
        Method::POST,
        "/api/auth/token",
        None,
        Some(json!({ "username": login, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");

    let cfg = &config::config().security;
    let access = response_cookie(&response, &cfg.access_cookie_name).expect("access cookie");
    let refresh = response_cookie(&response, &cfg.refresh_cookie_name).expect("refresh cookie");
    let user = body_json(response).await["user"].clone();

    Session {
        access,
        refresh,
        user,
    }
}

/// Register + login in one go; the derived username equals the email
/// local-part for the addresses the tests use.
pub async fn signup(app: &Router, email: &str, password: &str) -> Session {
    register_user(app, email, password).await;
    login_user(app, email, password).await
}

pub async fn create_book(app: &Router, session: &Session, title: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/api/books",
        Some(&session.access_only()),
        Some(json!({
            "title": title,
            "authors": "Jane Doe, John Doe",
            "genre": "Science Fiction",
            "publication_date": "1965-08-01"
        })),
    )
    .await;
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "book creation should succeed"
    );
    body_json(response).await
}

pub async fn create_list(app: &Router, session: &Session, name: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/api/readinglists",
        Some(&session.access_only()),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "list creation should succeed"
    );
    body_json(response).await
}
