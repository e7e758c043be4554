use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::database::manager::DatabaseError;
use crate::database::models::book::Book;
use crate::database::models::reading_list::{
    ReadingList, ReadingListItem, ReadingListItemResponse,
};
use crate::database::models::user::User;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, created_at";

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists != 0)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists != 0)
    }

    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Look a user up by username or email, whichever matches.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

const BOOK_COLUMNS: &str = "id, title, authors, genre, publication_date, description";

pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Book>, DatabaseError> {
        let books =
            sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Book>, DatabaseError> {
        let book =
            sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(book)
    }

    pub async fn insert(
        &self,
        title: &str,
        authors: &str,
        genre: &str,
        publication_date: NaiveDate,
        description: Option<&str>,
    ) -> Result<Book, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, authors, genre, publication_date, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(title)
        .bind(authors)
        .bind(genre)
        .bind(publication_date)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    /// Full-row update; returns None when the book does not exist.
    pub async fn update(
        &self,
        id: i64,
        title: &str,
        authors: &str,
        genre: &str,
        publication_date: NaiveDate,
        description: Option<&str>,
    ) -> Result<Option<Book>, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books
             SET title = ?2, authors = ?3, genre = ?4, publication_date = ?5, description = ?6
             WHERE id = ?1
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(authors)
        .bind(genre)
        .bind(publication_date)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const ITEM_COLUMNS: &str = "id, reading_list_id, book_id, \"order\"";

/// Columns for an item joined with its book, used to build wire responses.
const ITEM_BOOK_SELECT: &str = "
SELECT i.id AS item_id, i.\"order\" AS item_order,
       b.id, b.title, b.authors, b.genre, b.publication_date, b.description
FROM reading_list_books i
JOIN books b ON b.id = i.book_id";

pub struct ReadingListRepository {
    pool: SqlitePool,
}

impl ReadingListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<ReadingList>, DatabaseError> {
        let lists = sqlx::query_as::<_, ReadingList>(
            "SELECT id, name, user_id FROM reading_lists WHERE user_id = ?1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    pub async fn insert(&self, user_id: i64, name: &str) -> Result<ReadingList, DatabaseError> {
        let list = sqlx::query_as::<_, ReadingList>(
            "INSERT INTO reading_lists (name, user_id) VALUES (?1, ?2)
             RETURNING id, name, user_id",
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    /// Ownership-scoped lookup: rows owned by someone else are
    /// indistinguishable from rows that do not exist.
    pub async fn find_owned(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<ReadingList>, DatabaseError> {
        let list = sqlx::query_as::<_, ReadingList>(
            "SELECT id, name, user_id FROM reading_lists WHERE id = ?1 AND user_id = ?2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE reading_lists SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_owned(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM reading_lists WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The list's items with their books, ordered by position.
    pub async fn items(
        &self,
        list_id: i64,
    ) -> Result<Vec<ReadingListItemResponse>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "{ITEM_BOOK_SELECT} WHERE i.reading_list_id = ?1 ORDER BY i.\"order\", i.id"
        ))
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_response_from_row).collect()
    }

    pub async fn find_item_response(
        &self,
        item_id: i64,
    ) -> Result<Option<ReadingListItemResponse>, DatabaseError> {
        let row = sqlx::query(&format!("{ITEM_BOOK_SELECT} WHERE i.id = ?1"))
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(item_response_from_row).transpose()
    }

    pub async fn book_in_list(&self, list_id: i64, book_id: i64) -> Result<bool, DatabaseError> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reading_list_books
             WHERE reading_list_id = ?1 AND book_id = ?2)",
        )
        .bind(list_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    /// Append a book at the end of the list.
    ///
    /// The max-order read and the insert share one transaction so two
    /// concurrent appends to the same list cannot both observe the same
    /// maximum. A duplicate (list, book) pair racing past the handler-level
    /// check is caught by the unique constraint and reported as a duplicate.
    pub async fn add_item(
        &self,
        list_id: i64,
        book_id: i64,
    ) -> Result<ReadingListItem, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let max_order: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(\"order\"), 0) FROM reading_list_books WHERE reading_list_id = ?1",
        )
        .bind(list_id)
        .fetch_one(&mut *tx)
        .await?;

        let item = sqlx::query_as::<_, ReadingListItem>(&format!(
            "INSERT INTO reading_list_books (reading_list_id, book_id, \"order\")
             VALUES (?1, ?2, ?3)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(list_id)
        .bind(book_id)
        .bind(max_order + 1)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                DatabaseError::Duplicate("This book is already in the reading list.".to_string())
            }
            _ => DatabaseError::Sqlx(e),
        })?;

        tx.commit().await?;
        Ok(item)
    }

    /// Item lookup scoped to the list it must belong to.
    pub async fn find_item_in_list(
        &self,
        item_id: i64,
        list_id: i64,
    ) -> Result<Option<ReadingListItem>, DatabaseError> {
        let item = sqlx::query_as::<_, ReadingListItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM reading_list_books WHERE id = ?1 AND reading_list_id = ?2"
        ))
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Item lookup scoped to lists owned by the given user, through the join.
    pub async fn find_item_owned(
        &self,
        item_id: i64,
        user_id: i64,
    ) -> Result<Option<ReadingListItem>, DatabaseError> {
        let item = sqlx::query_as::<_, ReadingListItem>(
            "SELECT i.id, i.reading_list_id, i.book_id, i.\"order\"
             FROM reading_list_books i
             JOIN reading_lists l ON l.id = i.reading_list_id
             WHERE i.id = ?1 AND l.user_id = ?2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Remove an item. Remaining items keep their positions; gaps are fine.
    pub async fn delete_item(&self, item_id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM reading_list_books WHERE id = ?1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store the given position verbatim. No reconciliation of other items.
    pub async fn set_item_order(
        &self,
        item_id: i64,
        order: i64,
    ) -> Result<ReadingListItem, DatabaseError> {
        let item = sqlx::query_as::<_, ReadingListItem>(&format!(
            "UPDATE reading_list_books SET \"order\" = ?2 WHERE id = ?1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item_id)
        .bind(order)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }
}

fn item_response_from_row(row: &SqliteRow) -> Result<ReadingListItemResponse, DatabaseError> {
    let book = Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        authors: row.try_get("authors")?,
        genre: row.try_get("genre")?,
        publication_date: row.try_get("publication_date")?,
        description: row.try_get("description")?,
    };
    Ok(ReadingListItemResponse {
        id: row.try_get("item_id")?,
        book,
        order: row.try_get("item_order")?,
    })
}
