//! Books repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm, BookShort},
        pagination::PageRequest,
    },
};

const BOOK_COLUMNS: &str = "id, title, summary, isbn, author_id, language_id";

/// Book list row: author rendered as "Last, First"
const BOOK_SHORT_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id,
           CASE WHEN a.id IS NULL THEN NULL
                ELSE a.last_name || ', ' || a.first_name
           END AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Page of books ordered by title then author
    pub async fn list(&self, page: PageRequest) -> AppResult<(Vec<BookShort>, i64)> {
        let total = self.count().await?;

        let books = sqlx::query_as::<_, BookShort>(&format!(
            r#"
            {}
            ORDER BY b.title, a.last_name, a.first_name, b.id
            LIMIT $1 OFFSET $2
            "#,
            BOOK_SHORT_SELECT
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// All books of an author, by title
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let books = sqlx::query_as::<_, BookShort>(&format!(
            "{} WHERE b.author_id = $1 ORDER BY b.title, b.id",
            BOOK_SHORT_SELECT
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Books whose title contains `keyword`, ignoring case
    pub async fn count_title_containing(&self, keyword: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE title ILIKE '%' || $1 || '%'",
        )
        .bind(escape_like(keyword))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert a book and its genres
    pub async fn create(&self, data: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(data.title.trim())
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.language_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_genres(&mut tx, book.id, &data.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Replace a book and its genre list
    pub async fn update(&self, id: i32, data: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = $1, summary = $2, isbn = $3, author_id = $4, language_id = $5
            WHERE id = $6
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(data.title.trim())
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_genres(&mut tx, id, &data.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Delete a book. Refused while copies of it exist.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let copies: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if copies > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} still has {} cop{}",
                id,
                copies,
                if copies == 1 { "y" } else { "ies" }
            )));
        }

        // A copy added since the count trips the RESTRICT foreign key
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| super::conflict_on_foreign_key(e, || format!("Book {} still has copies", id)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

async fn insert_genres(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    if genre_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO book_genres (book_id, genre_id, position)
        SELECT $1, t.genre_id, t.position::int4
        FROM UNNEST($2::int4[]) WITH ORDINALITY AS t(genre_id, position)
        "#,
    )
    .bind(book_id)
    .bind(genre_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Escape LIKE wildcards so the keyword matches literally
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
