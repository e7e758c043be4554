use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const CREATE_USERS: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL
)";

const CREATE_BOOKS: &str = "
CREATE TABLE IF NOT EXISTS books (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT NOT NULL,
    authors          TEXT NOT NULL,
    genre            TEXT NOT NULL,
    publication_date TEXT NOT NULL,
    description      TEXT
)";

const CREATE_READING_LISTS: &str = "
CREATE TABLE IF NOT EXISTS reading_lists (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
)";

const CREATE_READING_LIST_BOOKS: &str = "
CREATE TABLE IF NOT EXISTS reading_list_books (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    reading_list_id INTEGER NOT NULL REFERENCES reading_lists(id) ON DELETE CASCADE,
    book_id         INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    \"order\"       INTEGER NOT NULL DEFAULT 0,
    UNIQUE (reading_list_id, book_id)
)";

/// Open the application pool and make sure the schema exists.
///
/// Foreign keys are switched on per connection so the ON DELETE CASCADE
/// clauses actually fire.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    info!("database ready");
    Ok(pool)
}

/// Create the schema if it is not there yet. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseError> {
    for statement in [
        CREATE_USERS,
        CREATE_BOOKS,
        CREATE_READING_LISTS,
        CREATE_READING_LIST_BOOKS,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
