mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{body_json, login_user, register_user, response_cookie, send, test_app};

#[tokio::test]
async fn register_returns_public_fields_only() {
    let app = test_app().await;

    let user = register_user(&app, "alice@example.com", "correct-horse").await;
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user["id"].as_i64().is_some());
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn register_rejects_password_mismatch_and_creates_no_user() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "bob@example.com",
            "password": "correct-horse",
            "password2": "battery-staple"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Passwords do not match");

    // The email is still free, so no user was created above
    register_user(&app, "bob@example.com", "correct-horse").await;
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = test_app().await;
    register_user(&app, "carol@example.com", "correct-horse").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "carol@example.com",
            "password": "correct-horse",
            "password2": "correct-horse"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "This email is already registered.");
}

#[tokio::test]
async fn register_rejects_short_password_and_bad_email() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "dan@example.com", "password": "short", "password2": "short" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "not-an-email",
            "password": "correct-horse",
            "password2": "correct-horse"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn derived_usernames_get_integer_suffixes() {
    let app = test_app().await;

    let first = register_user(&app, "sam@alpha.example", "correct-horse").await;
    let second = register_user(&app, "sam@beta.example", "correct-horse").await;
    let third = register_user(&app, "sam@gamma.example", "correct-horse").await;

    assert_eq!(first["username"], "sam");
    assert_eq!(second["username"], "sam1");
    assert_eq!(third["username"], "sam2");
}

#[tokio::test]
async fn explicit_username_is_kept_and_must_be_unique() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "eve@example.com",
            "password": "correct-horse",
            "password2": "correct-horse",
            "username": "reader-one"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["username"], "reader-one");

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "frank@example.com",
            "password": "correct-horse",
            "password2": "correct-horse",
            "username": "reader-one"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_username_falls_back_to_derivation() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "grace@example.com",
            "password": "correct-horse",
            "password2": "correct-horse",
            "username": "   "
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["username"], "grace");
}

#[tokio::test]
async fn login_sets_http_only_cookies() {
    let app = test_app().await;
    register_user(&app, "henry@example.com", "correct-horse").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token",
        None,
        Some(json!({ "username": "henry", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(response_cookie(&response, "access").is_some());
    assert!(response_cookie(&response, "refresh").is_some());

    let raw_cookies: Vec<_> = response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(raw_cookies.len(), 2);
    for cookie in &raw_cookies {
        assert!(cookie.contains("HttpOnly"), "cookie not HttpOnly: {cookie}");
        assert!(cookie.contains("SameSite=Lax"));
    }

    let body = body_json(response).await;
    assert!(body["access"].as_str().is_some());
    assert_eq!(body["user"]["username"], "henry");
}

#[tokio::test]
async fn login_accepts_email_and_rejects_bad_password() {
    let app = test_app().await;
    register_user(&app, "iris@example.com", "correct-horse").await;

    // Email works as the login identifier
    login_user(&app, "iris@example.com", "correct-horse").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token",
        None,
        Some(json!({ "username": "iris", "password": "battery-staple" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token",
        None,
        Some(json!({ "username": "nobody", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_mints_new_access_token() {
    let app = test_app().await;
    register_user(&app, "judy@example.com", "correct-horse").await;
    let session = login_user(&app, "judy", "correct-horse").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token/refresh",
        Some(&format!("refresh={}", session.refresh)),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response_cookie(&response, "access").is_some());
    assert!(body_json(response).await["access"].as_str().is_some());
}

#[tokio::test]
async fn refresh_accepts_body_fallback() {
    let app = test_app().await;
    register_user(&app, "kate@example.com", "correct-horse").await;
    let session = login_user(&app, "kate", "correct-horse").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token/refresh",
        None,
        Some(json!({ "refresh": session.refresh })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_missing_and_invalid_tokens() {
    let app = test_app().await;

    let response = send(&app, Method::POST, "/api/auth/token/refresh", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token/refresh",
        Some("refresh=not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_is_rejected_as_refresh_token() {
    let app = test_app().await;
    register_user(&app, "leo@example.com", "correct-horse").await;
    let session = login_user(&app, "leo", "correct-horse").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/token/refresh",
        Some(&format!("refresh={}", session.access)),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app().await;
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
