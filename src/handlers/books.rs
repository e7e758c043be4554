use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::extract::CurrentUser;
use crate::database::models::book::Book;
use crate::database::repository::BookRepository;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BookPayload {
    pub title: String,
    pub authors: String,
    pub genre: String,
    pub publication_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub genre: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// GET /api/books - list all books (public)
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = BookRepository::new(state.pool.clone()).list().await?;
    Ok(Json(books))
}

/// POST /api/books - create a book (requires auth)
pub async fn create(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<BookPayload>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = BookRepository::new(state.pool.clone())
        .insert(
            &payload.title,
            &payload.authors,
            &payload.genre,
            payload.publication_date,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /api/books/:id - retrieve a book (public)
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let book = BookRepository::new(state.pool.clone())
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found."))?;
    Ok(Json(book))
}

/// PUT /api/books/:id - replace a book (requires auth)
pub async fn update(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<Book>, ApiError> {
    let book = BookRepository::new(state.pool.clone())
        .update(
            id,
            &payload.title,
            &payload.authors,
            &payload.genre,
            payload.publication_date,
            payload.description.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found."))?;
    Ok(Json(book))
}

/// PATCH /api/books/:id - update some fields of a book (requires auth)
pub async fn partial_update(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<Book>, ApiError> {
    let repo = BookRepository::new(state.pool.clone());
    let current = repo
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found."))?;

    let description = patch.description.or(current.description);
    let book = repo
        .update(
            id,
            patch.title.as_deref().unwrap_or(&current.title),
            patch.authors.as_deref().unwrap_or(&current.authors),
            patch.genre.as_deref().unwrap_or(&current.genre),
            patch.publication_date.unwrap_or(current.publication_date),
            description.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found."))?;
    Ok(Json(book))
}

/// DELETE /api/books/:id - remove a book (requires auth)
pub async fn destroy(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = BookRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Book not found."));
    }
    Ok(StatusCode::NO_CONTENT)
}
