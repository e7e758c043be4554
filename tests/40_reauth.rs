mod common;

use axum::http::header::SET_COOKIE;
use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;

use bookshelf_api::auth::{encode_token, Claims, TOKEN_KIND_ACCESS, TOKEN_KIND_REFRESH};
use common::{body_json, response_cookie, send, signup, test_app};

fn expired_token(user_id: i64, username: &str, kind: &str) -> String {
    // Well past the decoder's leeway
    let now = Utc::now().timestamp();
    encode_token(&Claims {
        sub: user_id,
        username: username.to_string(),
        kind: kind.to_string(),
        exp: now - 3600,
        iat: now - 7200,
    })
    .expect("token")
}

#[tokio::test]
async fn missing_refresh_cookie_leaves_the_401_untouched() {
    let app = test_app().await;

    let response = send(&app, Method::GET, "/api/readinglists", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // The original rejection passes through: no refresh happened, no cookie set
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn expired_access_with_valid_refresh_is_replayed() {
    let app = test_app().await;
    let session = signup(&app, "ada@example.com", "correct-horse").await;
    let user_id = session.user["id"].as_i64().unwrap();

    let stale = expired_token(user_id, "ada", TOKEN_KIND_ACCESS);
    let cookies = format!("access={stale}; refresh={}", session.refresh);

    let response = send(&app, Method::GET, "/api/readinglists", Some(&cookies), None).await;

    // The middleware refreshed and replayed: the caller sees success plus
    // a fresh access cookie
    assert_eq!(response.status(), StatusCode::OK);
    let new_access = response_cookie(&response, "access").expect("refreshed access cookie");
    assert_ne!(new_access, stale);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn replayed_writes_carry_the_buffered_body() {
    let app = test_app().await;
    let session = signup(&app, "ben@example.com", "correct-horse").await;
    let user_id = session.user["id"].as_i64().unwrap();

    let stale = expired_token(user_id, "ben", TOKEN_KIND_ACCESS);
    let cookies = format!("access={stale}; refresh={}", session.refresh);

    let response = send(
        &app,
        Method::POST,
        "/api/readinglists",
        Some(&cookies),
        Some(json!({ "name": "Replayed" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["name"], "Replayed");
}

#[tokio::test]
async fn garbage_refresh_token_is_an_invalid_token() {
    let app = test_app().await;
    let session = signup(&app, "cam@example.com", "correct-horse").await;
    let user_id = session.user["id"].as_i64().unwrap();

    let stale = expired_token(user_id, "cam", TOKEN_KIND_ACCESS);
    let cookies = format!("access={stale}; refresh=not-a-jwt");

    let response = send(&app, Method::GET, "/api/readinglists", Some(&cookies), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Invalid token.");
}

#[tokio::test]
async fn expired_refresh_token_expires_the_session() {
    let app = test_app().await;
    let session = signup(&app, "dot@example.com", "correct-horse").await;
    let user_id = session.user["id"].as_i64().unwrap();

    let stale_access = expired_token(user_id, "dot", TOKEN_KIND_ACCESS);
    let stale_refresh = expired_token(user_id, "dot", TOKEN_KIND_REFRESH);
    let cookies = format!("access={stale_access}; refresh={stale_refresh}");

    let response = send(&app, Method::GET, "/api/readinglists", Some(&cookies), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Session expired. Please log in again.");
}

#[tokio::test]
async fn access_token_in_refresh_cookie_is_invalid() {
    let app = test_app().await;
    let session = signup(&app, "edo@example.com", "correct-horse").await;
    let user_id = session.user["id"].as_i64().unwrap();

    // A (valid) access token is not an acceptable refresh credential
    let stale = expired_token(user_id, "edo", TOKEN_KIND_ACCESS);
    let cookies = format!("access={stale}; refresh={}", session.access);

    let response = send(&app, Method::GET, "/api/readinglists", Some(&cookies), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Invalid token.");
}

#[tokio::test]
async fn fresh_sessions_are_not_intercepted() {
    let app = test_app().await;
    let session = signup(&app, "fin@example.com", "correct-horse").await;

    let response = send(
        &app,
        Method::GET,
        "/api/readinglists",
        Some(&session.cookie_header()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    // No refresh was needed, so no new access cookie was issued
    assert!(response.headers().get(SET_COOKIE).is_none());
}
