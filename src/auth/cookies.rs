use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use crate::config;

/// HTTP-only access-token cookie, SameSite=Lax so browser navigation
/// still carries it.
pub fn access_cookie(token: &str) -> Cookie<'static> {
    let cfg = &config::config().security;
    build(
        cfg.access_cookie_name.clone(),
        token.to_string(),
        Duration::minutes(cfg.access_token_lifetime_mins),
    )
}

pub fn refresh_cookie(token: &str) -> Cookie<'static> {
    let cfg = &config::config().security;
    build(
        cfg.refresh_cookie_name.clone(),
        token.to_string(),
        Duration::hours(cfg.refresh_token_lifetime_hours),
    )
}

fn build(name: String, value: String, max_age: Duration) -> Cookie<'static> {
    let cfg = &config::config().security;
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Pull a cookie value out of request headers by name.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for parsed in Cookie::split_parse(raw) {
            if let Ok(cookie) = parsed {
                if cookie.name() == name {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }
    None
}
