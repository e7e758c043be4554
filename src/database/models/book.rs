use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Comma-joined author names, stored as free text
    pub authors: String,
    pub genre: String,
    pub publication_date: NaiveDate,
    pub description: Option<String>,
}
