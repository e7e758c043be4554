use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::models::book::Book;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReadingList {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
}

/// Join row binding one book to one reading list at a position.
/// A book appears at most once per list; the position is unique only by
/// convention, the schema does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReadingListItem {
    pub id: i64,
    pub reading_list_id: i64,
    pub book_id: i64,
    pub order: i64,
}

/// Wire format for an item: the nested book plus its position.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingListItemResponse {
    pub id: i64,
    pub book: Book,
    pub order: i64,
}

/// Wire format for a reading list with its items, ordered by position.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingListResponse {
    pub id: i64,
    pub name: String,
    pub items: Vec<ReadingListItemResponse>,
}
