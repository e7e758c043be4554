use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::auth::extract::CurrentUser;
use crate::database::models::reading_list::{ReadingListItemResponse, ReadingListResponse};
use crate::database::repository::{BookRepository, ReadingListRepository};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadingListPayload {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingListPatch {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub book_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub order: Option<i64>,
}

/// GET /api/readinglists - the caller's reading lists with their items
pub async fn list(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReadingListResponse>>, ApiError> {
    let repo = ReadingListRepository::new(state.pool.clone());
    let lists = repo.list_for_user(user.id).await?;

    let mut out = Vec::with_capacity(lists.len());
    for list in lists {
        let items = repo.items(list.id).await?;
        out.push(ReadingListResponse {
            id: list.id,
            name: list.name,
            items,
        });
    }
    Ok(Json(out))
}

/// POST /api/readinglists - create a reading list owned by the caller
pub async fn create(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ReadingListPayload>,
) -> Result<(StatusCode, Json<ReadingListResponse>), ApiError> {
    let list = ReadingListRepository::new(state.pool.clone())
        .insert(user.id, &payload.name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReadingListResponse {
            id: list.id,
            name: list.name,
            items: Vec::new(),
        }),
    ))
}

/// GET /api/readinglists/:id - retrieve one of the caller's lists
pub async fn retrieve(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReadingListResponse>, ApiError> {
    let repo = ReadingListRepository::new(state.pool.clone());
    let list = repo
        .find_owned(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list not found."))?;
    let items = repo.items(list.id).await?;
    Ok(Json(ReadingListResponse {
        id: list.id,
        name: list.name,
        items,
    }))
}

/// PUT /api/readinglists/:id - rename one of the caller's lists
pub async fn update(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReadingListPayload>,
) -> Result<Json<ReadingListResponse>, ApiError> {
    let repo = ReadingListRepository::new(state.pool.clone());
    let list = repo
        .find_owned(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list not found."))?;

    repo.rename(list.id, &payload.name).await?;
    let items = repo.items(list.id).await?;
    Ok(Json(ReadingListResponse {
        id: list.id,
        name: payload.name,
        items,
    }))
}

/// PATCH /api/readinglists/:id - partially update one of the caller's lists
pub async fn partial_update(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ReadingListPatch>,
) -> Result<Json<ReadingListResponse>, ApiError> {
    let repo = ReadingListRepository::new(state.pool.clone());
    let list = repo
        .find_owned(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list not found."))?;

    let name = match patch.name {
        Some(name) => {
            repo.rename(list.id, &name).await?;
            name
        }
        None => list.name,
    };

    let items = repo.items(list.id).await?;
    Ok(Json(ReadingListResponse {
        id: list.id,
        name,
        items,
    }))
}

/// DELETE /api/readinglists/:id - delete one of the caller's lists
pub async fn destroy(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = ReadingListRepository::new(state.pool.clone())
        .delete_owned(id, user.id)
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Reading list not found."));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/readinglists/:list_id/add_book - append a book to a list
///
/// The new item goes to the end: its position is one past the current
/// maximum. A book can appear in a list only once.
pub async fn add_book(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
    Json(payload): Json<AddBookRequest>,
) -> Result<(StatusCode, Json<ReadingListItemResponse>), ApiError> {
    let repo = ReadingListRepository::new(state.pool.clone());
    let list = repo
        .find_owned(list_id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list not found."))?;

    let book = BookRepository::new(state.pool.clone())
        .find(payload.book_id)
        .await?
        .ok_or_else(|| ApiError::validation_error("Invalid book_id: no such book.", None))?;

    if repo.book_in_list(list.id, book.id).await? {
        return Err(ApiError::bad_request(
            "This book is already in the reading list.",
        ));
    }

    let item = repo.add_item(list.id, book.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReadingListItemResponse {
            id: item.id,
            book,
            order: item.order,
        }),
    ))
}

/// DELETE /api/readinglists/:list_id/remove_book/:item_id - drop an item
///
/// Remaining items keep their positions; the sequence may end up with gaps.
pub async fn remove_book(
    user: CurrentUser,
    State(state): State<AppState>,
    Path((list_id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let repo = ReadingListRepository::new(state.pool.clone());
    let list = repo
        .find_owned(list_id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list not found."))?;

    let item = repo
        .find_item_in_list(item_id, list.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list item not found."))?;

    repo.delete_item(item.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/readinglists/:list_id/update_item/:item_id - move an item
///
/// The item is resolved by id across all of the caller's lists; the list
/// id in the path only shapes the route. The given position is stored
/// verbatim and no other item is renumbered.
pub async fn update_item(
    user: CurrentUser,
    State(state): State<AppState>,
    Path((_list_id, item_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ReadingListItemResponse>, ApiError> {
    let Some(order) = payload.order else {
        return Err(ApiError::bad_request("Order not provided."));
    };

    let repo = ReadingListRepository::new(state.pool.clone());
    let item = repo
        .find_item_owned(item_id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list item not found."))?;

    let item = repo.set_item_order(item.id, order).await?;
    let response = repo
        .find_item_response(item.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reading list item not found."))?;
    Ok(Json(response))
}
