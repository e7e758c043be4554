use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;

use crate::auth::middleware::ReauthLayer;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

/// Assemble the full application router.
///
/// The reauth layer sits closest to the routes so a refreshed replay runs
/// the whole routing pass again; CORS and tracing wrap it.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(auth_routes())
        .merge(book_routes())
        .merge(reading_list_routes())
        .layer(ReauthLayer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/token", post(auth::login))
        .route("/api/auth/token/refresh", post(auth::refresh))
}

fn book_routes() -> Router<AppState> {
    use handlers::books;

    Router::new()
        .route("/api/books", get(books::list).post(books::create))
        .route(
            "/api/books/:id",
            get(books::retrieve)
                .put(books::update)
                .patch(books::partial_update)
                .delete(books::destroy),
        )
}

fn reading_list_routes() -> Router<AppState> {
    use handlers::reading_lists;

    Router::new()
        .route(
            "/api/readinglists",
            get(reading_lists::list).post(reading_lists::create),
        )
        .route(
            "/api/readinglists/:id",
            get(reading_lists::retrieve)
                .put(reading_lists::update)
                .patch(reading_lists::partial_update)
                .delete(reading_lists::destroy),
        )
        .route(
            "/api/readinglists/:list_id/add_book",
            post(reading_lists::add_book),
        )
        .route(
            "/api/readinglists/:list_id/remove_book/:item_id",
            delete(reading_lists::remove_book),
        )
        .route(
            "/api/readinglists/:list_id/update_item/:item_id",
            patch(reading_lists::update_item),
        )
}
